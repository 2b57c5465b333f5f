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

//! The per-character model used while toggling formats.

use crate::entity::{Attributes, EntityKind};
use crate::markup::tokenize_editor_markup;
use crate::markup::walker::{walk_tokens, TokenSink};
use crate::markup::EmbedAttributes;

/// A format applied to a character, with the payload it was applied with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActiveFormat {
    pub kind: EntityKind,
    pub attributes: Attributes,
}

impl ActiveFormat {
    pub fn new(kind: EntityKind, attributes: Attributes) -> Self {
        Self { kind, attributes }
    }
}

/// Formats on one character, at most one per kind, in the order they were
/// added. The order decides ties when markup is regenerated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatSet(Vec<ActiveFormat>);

impl FormatSet {
    pub fn contains_kind(&self, kind: EntityKind) -> bool {
        self.0.iter().any(|f| f.kind == kind)
    }

    pub fn contains(&self, format: &ActiveFormat) -> bool {
        self.0.contains(format)
    }

    /// Add `format`, or update the payload in place if its kind is
    /// already present.
    pub fn insert(&mut self, format: ActiveFormat) {
        match self.0.iter_mut().find(|f| f.kind == format.kind) {
            Some(existing) => existing.attributes = format.attributes,
            None => self.0.push(format),
        }
    }

    pub fn remove(&mut self, kind: EntityKind) -> bool {
        let before = self.0.len();
        self.0.retain(|f| f.kind != kind);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveFormat> {
        self.0.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.0.iter().map(|f| f.kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharCell {
    pub ch: char,
    pub formats: FormatSet,
    /// Set when the cell is an embed; such cells carry no formats.
    pub media: Option<EmbedAttributes>,
}

impl CharCell {
    pub fn is_atomic(&self) -> bool {
        self.media.is_some()
    }
}

/// Expand editor markup into one cell per character.
pub fn char_cells(markup: &str) -> Vec<CharCell> {
    let tokens = tokenize_editor_markup(markup);
    let mut builder = CellBuilder::default();
    walk_tokens(&tokens, &mut builder);
    builder.cells
}

#[derive(Default)]
struct CellBuilder {
    cells: Vec<CharCell>,
    open: Vec<ActiveFormat>,
}

impl CellBuilder {
    fn active(&self) -> FormatSet {
        let mut set = FormatSet::default();
        for format in &self.open {
            // The outermost of two same-kind elements wins.
            if !set.contains_kind(format.kind) {
                set.insert(format.clone());
            }
        }
        set
    }
}

impl TokenSink for CellBuilder {
    fn text(&mut self, text: &str) {
        let formats = self.active();
        self.cells.extend(text.chars().map(|ch| CharCell {
            ch,
            formats: formats.clone(),
            media: None,
        }));
    }

    fn atomic(&mut self, embed: &EmbedAttributes) {
        self.cells.push(CharCell {
            ch: '\u{FFFC}',
            formats: FormatSet::default(),
            media: Some(embed.clone()),
        });
    }

    fn enter(&mut self, kind: EntityKind, attributes: &Attributes) {
        self.open.push(ActiveFormat::new(kind, attributes.clone()));
    }

    fn exit(&mut self) {
        self.open.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(cell: &CharCell) -> Vec<EntityKind> {
        cell.formats.kinds().collect()
    }

    #[test]
    fn characters_inherit_ancestor_formats_outermost_first() {
        let cells = char_cells("a<b>b<i>c</i></b>");
        assert_eq!(cells.len(), 3);
        assert!(kinds(&cells[0]).is_empty());
        assert_eq!(kinds(&cells[1]), vec![EntityKind::Bold]);
        assert_eq!(
            kinds(&cells[2]),
            vec![EntityKind::Bold, EntityKind::Italic]
        );
    }

    #[test]
    fn embeds_are_single_unformatted_cells() {
        let cells = char_cells(r#"<b>a<img alt="🙂🙂" data-document-id="3">b</b>"#);
        assert_eq!(cells.len(), 3);
        assert!(cells[1].is_atomic());
        assert!(cells[1].formats.is_empty());
        assert_eq!(
            cells[1].media.as_ref().and_then(|m| m.document_id.as_deref()),
            Some("3")
        );
    }

    #[test]
    fn whitespace_and_breaks_are_kept() {
        let cells = char_cells(" a<br>b ");
        let text: String = cells.iter().map(|c| c.ch).collect();
        assert_eq!(text, " a\nb ");
    }

    #[test]
    fn link_cells_remember_their_url() {
        let cells = char_cells(r#"<a href="https://x.y">l</a>"#);
        assert!(cells[0].formats.contains(&ActiveFormat::new(
            EntityKind::TextLink,
            Attributes::Url("https://x.y".into())
        )));
    }

    #[test]
    fn format_set_keeps_insertion_order_and_one_entry_per_kind() {
        let mut set = FormatSet::default();
        set.insert(ActiveFormat::new(EntityKind::Italic, Attributes::None));
        set.insert(ActiveFormat::new(EntityKind::Bold, Attributes::None));
        set.insert(ActiveFormat::new(EntityKind::Italic, Attributes::None));
        assert_eq!(
            set.kinds().collect::<Vec<_>>(),
            vec![EntityKind::Italic, EntityKind::Bold]
        );
        assert!(set.remove(EntityKind::Italic));
        assert!(!set.remove(EntityKind::Italic));
        assert_eq!(set.len(), 1);
    }
}
