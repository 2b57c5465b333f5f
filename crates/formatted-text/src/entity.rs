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

//! The wire representation: plain text plus a flat list of entities.
//!
//! Entity offsets and lengths count Unicode scalar values of
//! [`FormattedText::text`]. Transports that count UTF-16 code units can use
//! [`FormattedText::to_utf16`].

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use widestring::Utf16String;

use crate::markup::render::render_formatted_text;

/// The kinds of annotation the composer understands.
///
/// The string form is the transport name, which is also the value of the
/// `data-entity-type` attribute recognised in markup.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
pub enum EntityKind {
    #[strum(serialize = "MessageEntityBold")]
    Bold,
    #[strum(serialize = "MessageEntityItalic")]
    Italic,
    #[strum(serialize = "MessageEntityUnderline")]
    Underline,
    #[strum(serialize = "MessageEntityStrike")]
    Strike,
    #[strum(serialize = "MessageEntityCode")]
    Code,
    #[strum(serialize = "MessageEntityPre")]
    Pre,
    #[strum(serialize = "MessageEntityBlockquote")]
    Blockquote,
    #[strum(serialize = "MessageEntityTextUrl")]
    TextLink,
    #[strum(serialize = "MessageEntityCustomEmoji")]
    CustomEmoji,
    #[strum(serialize = "MessageEntitySpoiler")]
    Spoiler,
    #[strum(serialize = "MessageEntityMentionName")]
    MentionName,
}

impl EntityKind {
    /// Kinds that occupy exactly one embed in the editor and never wrap
    /// other content.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Self::CustomEmoji)
    }
}

/// Per-kind payload of an annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Attributes {
    #[default]
    None,
    Url(String),
    Language(Option<String>),
    DocumentId(String),
    CanCollapse(bool),
    UserId(String),
}

impl Attributes {
    /// The attributes a freshly-applied format of `kind` starts with.
    pub fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::TextLink => Self::Url(String::new()),
            EntityKind::Pre => Self::Language(None),
            EntityKind::Blockquote => Self::CanCollapse(false),
            EntityKind::CustomEmoji => Self::DocumentId(String::new()),
            EntityKind::MentionName => Self::UserId(String::new()),
            _ => Self::None,
        }
    }
}

/// One flattened annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
    pub url: Option<String>,
    pub language: Option<String>,
    pub document_id: Option<String>,
    pub user_id: Option<String>,
    pub can_collapse: Option<bool>,
}

impl Entity {
    /// An entity with no kind-specific fields set.
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            language: None,
            document_id: None,
            user_id: None,
            can_collapse: None,
        }
    }

    pub(crate) fn from_annotation(
        kind: EntityKind,
        offset: usize,
        length: usize,
        attributes: &Attributes,
    ) -> Self {
        let mut entity = Self::new(kind, offset, length);
        match (kind, attributes) {
            (EntityKind::TextLink, Attributes::Url(url)) => {
                entity.url = Some(url.clone());
            }
            (EntityKind::Pre, Attributes::Language(language)) => {
                entity.language =
                    language.clone().filter(|lang| !lang.is_empty());
            }
            (EntityKind::CustomEmoji, Attributes::DocumentId(id)) => {
                entity.document_id = Some(id.clone());
            }
            (EntityKind::MentionName, Attributes::UserId(id)) => {
                entity.user_id = Some(id.clone());
            }
            (EntityKind::Blockquote, Attributes::CanCollapse(flag)) => {
                entity.can_collapse = Some(*flag);
            }
            (EntityKind::TextLink, _) => entity.url = Some(String::new()),
            (EntityKind::Blockquote, _) => entity.can_collapse = Some(false),
            _ => {}
        }
        entity
    }

    /// Recover the annotation payload carried by this entity.
    pub fn attributes(&self) -> Attributes {
        match self.kind {
            EntityKind::TextLink => {
                Attributes::Url(self.url.clone().unwrap_or_default())
            }
            EntityKind::Pre => Attributes::Language(self.language.clone()),
            EntityKind::CustomEmoji => Attributes::DocumentId(
                self.document_id.clone().unwrap_or_default(),
            ),
            EntityKind::MentionName => {
                Attributes::UserId(self.user_id.clone().unwrap_or_default())
            }
            EntityKind::Blockquote => {
                Attributes::CanCollapse(self.can_collapse.unwrap_or(false))
            }
            _ => Attributes::None,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn contains(&self, other: &Entity) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }
}

/// Plain text plus the entities annotating it, ready for transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormattedText {
    pub text: String,
    pub entities: Vec<Entity>,
}

impl FormattedText {
    pub fn new(text: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }

    /// Length of [`Self::text`] in Unicode scalar values.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }

    /// Render back into canonical composer markup.
    ///
    /// The output is plain HTML: literal markdown delimiters in the text are
    /// not escaped, so parse it again with
    /// [`ParseOptions::skip_markdown`](crate::ParseOptions::skip_markdown)
    /// set to get the same payload back.
    pub fn to_html(&self) -> String {
        render_formatted_text(self)
    }

    /// The same payload with text and offsets in UTF-16 code units.
    pub fn to_utf16(&self) -> Utf16FormattedText {
        let mut prefix = Vec::with_capacity(self.text.len() + 1);
        let mut units = 0;
        prefix.push(0);
        for c in self.text.chars() {
            units += c.len_utf16();
            prefix.push(units);
        }
        let at = |offset: usize| {
            prefix.get(offset).copied().unwrap_or(units)
        };
        let entities = self
            .entities
            .iter()
            .map(|entity| {
                let start = at(entity.offset);
                let end = at(entity.end());
                Entity {
                    offset: start,
                    length: end - start,
                    ..entity.clone()
                }
            })
            .collect();
        Utf16FormattedText {
            text: Utf16String::from_str(&self.text),
            entities,
        }
    }
}

/// [`FormattedText`] measured in UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utf16FormattedText {
    pub text: Utf16String,
    pub entities: Vec<Entity>,
}
