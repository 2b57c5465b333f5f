// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::entity::EntityKind;

/// The formats a user can toggle from the toolbar.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Monospace,
    Spoiler,
    Link,
    Quote,
}

impl FormatKind {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Bold => EntityKind::Bold,
            Self::Italic => EntityKind::Italic,
            Self::Underline => EntityKind::Underline,
            Self::Strikethrough => EntityKind::Strike,
            Self::Monospace => EntityKind::Code,
            Self::Spoiler => EntityKind::Spoiler,
            Self::Link => EntityKind::TextLink,
            Self::Quote => EntityKind::Blockquote,
        }
    }

    /// The toolbar format for an entity kind, if it has one.
    pub fn from_entity_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Bold => Some(Self::Bold),
            EntityKind::Italic => Some(Self::Italic),
            EntityKind::Underline => Some(Self::Underline),
            EntityKind::Strike => Some(Self::Strikethrough),
            EntityKind::Code => Some(Self::Monospace),
            EntityKind::Spoiler => Some(Self::Spoiler),
            EntityKind::TextLink => Some(Self::Link),
            EntityKind::Blockquote => Some(Self::Quote),
            EntityKind::Pre
            | EntityKind::CustomEmoji
            | EntityKind::MentionName => None,
        }
    }

    /// Format bound to Ctrl/Cmd + `key`. Link (`k`) opens the URL prompt
    /// rather than toggling directly.
    pub fn for_shortcut(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "b" => Some(Self::Bold),
            "i" => Some(Self::Italic),
            "u" => Some(Self::Underline),
            "s" => Some(Self::Strikethrough),
            "m" => Some(Self::Monospace),
            "p" => Some(Self::Spoiler),
            "k" => Some(Self::Link),
            _ => None,
        }
    }
}

/// How a toolbar button should be shown for the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ButtonState {
    Active,
    Disabled,
    Enabled,
}

/// Which formats refuse to be combined with others.
///
/// An exclusive format is disabled while any other format is selected, and
/// every other format is disabled while an exclusive one is selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatPolicy {
    exclusive: Vec<FormatKind>,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            exclusive: vec![FormatKind::Monospace, FormatKind::Quote],
        }
    }
}

impl FormatPolicy {
    /// A policy where every format combines with every other.
    pub fn permissive() -> Self {
        Self {
            exclusive: Vec::new(),
        }
    }

    pub fn with_exclusive(mut self, kind: FormatKind) -> Self {
        if !self.exclusive.contains(&kind) {
            self.exclusive.push(kind);
        }
        self
    }

    pub fn is_exclusive(&self, kind: FormatKind) -> bool {
        self.exclusive.contains(&kind)
    }

    pub fn button_state(
        &self,
        kind: FormatKind,
        selected: &[FormatKind],
    ) -> ButtonState {
        if selected.contains(&kind) {
            return ButtonState::Active;
        }
        let blocked = if self.is_exclusive(kind) {
            selected.iter().any(|&other| other != kind)
        } else {
            selected.iter().any(|&other| self.is_exclusive(other))
        };
        if blocked {
            ButtonState::Disabled
        } else {
            ButtonState::Enabled
        }
    }
}
