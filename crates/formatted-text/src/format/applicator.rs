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

//! Toggling a format over a selection.

use strum::IntoEnumIterator;

use super::char_cell::{char_cells, ActiveFormat, CharCell};
use super::format_kind::{ButtonState, FormatKind, FormatPolicy};
use super::regenerate::regenerate;
use crate::dom::offset_mapper::{range_for_offsets, selection_offsets};
use crate::dom::{DomNode, DomRange, EditableDom};
use crate::entity::Attributes;
use crate::error::FormatError;
use crate::link::normalize_link_url;

/// The result of a successful toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatOutcome {
    pub markup: String,
    /// The toggled characters, as a range in the tree built from `markup`.
    pub selection: DomRange,
    /// First toggled character.
    pub start: usize,
    /// Last toggled character (inclusive).
    pub end: usize,
}

/// Add or remove `kind` on the characters `start..=end` of `markup`.
///
/// `attributes` supplies the payload for formats that need one (the URL of
/// a link); it defaults to the kind's empty payload. Embeds in the range
/// are left untouched.
pub fn apply_format(
    markup: &str,
    start: usize,
    end: usize,
    kind: FormatKind,
    is_currently_active: bool,
    attributes: Option<Attributes>,
) -> Result<FormatOutcome, FormatError> {
    let mut cells = char_cells(markup);
    if let Err(error) = validate_selection(&cells, start, end) {
        tracing::warn!(%error, "Dropping format request");
        return Err(error);
    }

    let entity_kind = kind.entity_kind();
    let format = ActiveFormat::new(
        entity_kind,
        attributes.unwrap_or_else(|| Attributes::default_for(entity_kind)),
    );
    for cell in cells[start..=end].iter_mut().filter(|c| !c.is_atomic()) {
        if is_currently_active {
            cell.formats.remove(entity_kind);
        } else {
            cell.formats.insert(format.clone());
        }
    }

    let markup = regenerate(&cells);
    let dom = EditableDom::parse(&markup);
    let selection = range_for_offsets(&dom, start, end);
    tracing::debug!(%kind, start, end, removed = is_currently_active, "Toggled format");
    Ok(FormatOutcome {
        markup,
        selection,
        start,
        end,
    })
}

fn validate_selection(
    cells: &[CharCell],
    start: usize,
    end: usize,
) -> Result<(), FormatError> {
    if cells.is_empty() {
        Err(FormatError::EmptyMarkup)
    } else if start > end {
        Err(FormatError::InvertedSelection { start, end })
    } else if end >= cells.len() {
        Err(FormatError::SelectionOutOfRange {
            start,
            end,
            len: cells.len(),
        })
    } else {
        Ok(())
    }
}

/// Toolbar logic: which formats a selection carries, which buttons are
/// available, and toggling through a [`FormatPolicy`].
#[derive(Clone, Debug, Default)]
pub struct TextFormatter {
    policy: FormatPolicy,
}

impl TextFormatter {
    pub fn new(policy: FormatPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FormatPolicy {
        &self.policy
    }

    /// Formats present anywhere in `range`, or around the caret when the
    /// range is collapsed.
    pub fn selected_formats(
        &self,
        dom: &EditableDom,
        range: &DomRange,
    ) -> Vec<FormatKind> {
        let mut found: Vec<FormatKind> = Vec::new();
        let mut add = |kind| {
            if let Some(format) = FormatKind::from_entity_kind(kind) {
                if !found.contains(&format) {
                    found.push(format);
                }
            }
        };

        match selection_offsets(dom, range) {
            Some((start, end)) => {
                let cells = char_cells(&dom.inner_html());
                for cell in cells.iter().take(end + 1).skip(start) {
                    cell.formats.kinds().for_each(&mut add);
                }
            }
            None => {
                let mut node = Some(range.start.node);
                while let Some(handle) = node {
                    if let DomNode::Container {
                        format: Some((kind, _)),
                        ..
                    } = dom.node(handle)
                    {
                        add(*kind);
                    }
                    node = dom.parent(handle);
                }
            }
        }
        found
    }

    /// The state of every toolbar button for the given selected formats.
    pub fn button_states(
        &self,
        selected: &[FormatKind],
    ) -> Vec<(FormatKind, ButtonState)> {
        FormatKind::iter()
            .map(|kind| (kind, self.policy.button_state(kind, selected)))
            .collect()
    }

    /// Toggle `kind` over `range`: removed when the selection already
    /// carries it, added otherwise. Adding a link needs a URL, so use
    /// [`Self::set_link`] for that.
    pub fn toggle(
        &self,
        markup: &str,
        range: &DomRange,
        kind: FormatKind,
    ) -> Result<FormatOutcome, FormatError> {
        let dom = EditableDom::parse(markup);
        let (start, end) = self.checked_selection(&dom, range)?;
        let selected = self.selected_formats(&dom, range);
        match self.policy.button_state(kind, &selected) {
            ButtonState::Disabled => {
                tracing::warn!(%kind, "Format is disabled for this selection");
                Err(FormatError::FormatDisabled(kind))
            }
            ButtonState::Active => {
                apply_format(markup, start, end, kind, true, None)
            }
            ButtonState::Enabled if kind == FormatKind::Link => {
                Err(FormatError::MissingLinkUrl)
            }
            ButtonState::Enabled => {
                apply_format(markup, start, end, kind, false, None)
            }
        }
    }

    /// Link `range` to the normalised form of `url`, replacing any link
    /// already there.
    pub fn set_link(
        &self,
        markup: &str,
        range: &DomRange,
        url: &str,
    ) -> Result<FormatOutcome, FormatError> {
        let url = normalize_link_url(url).ok_or(FormatError::MissingLinkUrl)?;
        let dom = EditableDom::parse(markup);
        let (start, end) = self.checked_selection(&dom, range)?;
        let selected = self.selected_formats(&dom, range);
        if self.policy.button_state(FormatKind::Link, &selected)
            == ButtonState::Disabled
        {
            return Err(FormatError::FormatDisabled(FormatKind::Link));
        }
        apply_format(
            markup,
            start,
            end,
            FormatKind::Link,
            false,
            Some(Attributes::Url(url)),
        )
    }

    fn checked_selection(
        &self,
        dom: &EditableDom,
        range: &DomRange,
    ) -> Result<(usize, usize), FormatError> {
        selection_offsets(dom, range).ok_or_else(|| {
            tracing::warn!("Ignoring format request on a collapsed selection");
            FormatError::EmptySelection
        })
    }
}
