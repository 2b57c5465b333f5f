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

//! A small editable tree standing in for the live editing surface.
//!
//! The tree is built from the same balanced token walk as the annotation
//! tree, so its character count always agrees with the per-character model
//! the format applicator works on. Text nodes count their characters,
//! embeds count as one.

pub mod offset_mapper;

use crate::entity::{Attributes, EntityKind};
use crate::markup::render::{
    write_close_tag, write_embed, write_open_tag, write_text,
};
use crate::markup::tokenize_editor_markup;
use crate::markup::walker::{walk_tokens, TokenSink};
use crate::markup::EmbedAttributes;

pub use offset_mapper::{to_absolute_offset, to_dom_position, Edge};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DomHandle(usize);

impl DomHandle {
    pub fn root() -> Self {
        Self(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomNode {
    /// The root (no format) or a formatting element.
    Container {
        format: Option<(EntityKind, Attributes)>,
        children: Vec<DomHandle>,
    },
    Text(String),
    Atomic(EmbedAttributes),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct DomEntry {
    node: DomNode,
    parent: Option<DomHandle>,
    len: usize,
}

/// A point inside the tree. For text nodes `offset` counts characters, for
/// containers it is a child index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomPosition {
    pub node: DomHandle,
    pub offset: usize,
}

impl DomPosition {
    pub fn new(node: DomHandle, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomRange {
    pub start: DomPosition,
    pub end: DomPosition,
}

impl DomRange {
    pub fn new(start: DomPosition, end: DomPosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: DomPosition) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditableDom {
    nodes: Vec<DomEntry>,
}

impl EditableDom {
    pub fn parse(markup: &str) -> Self {
        let tokens = tokenize_editor_markup(markup);
        let mut builder = DomBuilder::new();
        walk_tokens(&tokens, &mut builder);
        builder.finish()
    }

    pub fn root(&self) -> DomHandle {
        DomHandle::root()
    }

    pub fn node(&self, handle: DomHandle) -> &DomNode {
        &self.nodes[handle.0].node
    }

    pub fn parent(&self, handle: DomHandle) -> Option<DomHandle> {
        self.nodes[handle.0].parent
    }

    pub fn children(&self, handle: DomHandle) -> &[DomHandle] {
        match self.node(handle) {
            DomNode::Container { children, .. } => children,
            DomNode::Text(_) | DomNode::Atomic(_) => &[],
        }
    }

    /// Characters this node contributes: text length, 1 for an embed, the
    /// sum of the children for a container.
    pub fn node_len(&self, handle: DomHandle) -> usize {
        self.nodes[handle.0].len
    }

    pub fn text_len(&self) -> usize {
        self.node_len(self.root())
    }

    pub fn index_in_parent(&self, handle: DomHandle) -> Option<usize> {
        let parent = self.parent(handle)?;
        self.children(parent).iter().position(|&c| c == handle)
    }

    /// Find a text node by content, first in document order.
    pub fn find_text(&self, text: &str) -> Option<DomHandle> {
        (0..self.nodes.len())
            .map(DomHandle)
            .find(|&h| matches!(self.node(h), DomNode::Text(t) if t == text))
    }

    /// Serialize the tree back into canonical markup.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_children(self.root(), &mut out);
        out
    }

    fn write_children(&self, handle: DomHandle, out: &mut String) {
        for &child in self.children(handle) {
            match self.node(child) {
                DomNode::Container {
                    format: Some((kind, attributes)),
                    ..
                } => {
                    write_open_tag(out, *kind, attributes);
                    self.write_children(child, out);
                    write_close_tag(out, *kind);
                }
                DomNode::Container { format: None, .. } => {
                    self.write_children(child, out)
                }
                DomNode::Text(text) => write_text(out, text),
                DomNode::Atomic(embed) => write_embed(out, embed),
            }
        }
    }
}

struct DomBuilder {
    nodes: Vec<DomEntry>,
    open: Vec<DomHandle>,
}

impl DomBuilder {
    fn new() -> Self {
        Self {
            nodes: vec![DomEntry {
                node: DomNode::Container {
                    format: None,
                    children: Vec::new(),
                },
                parent: None,
                len: 0,
            }],
            open: vec![DomHandle::root()],
        }
    }

    fn current(&self) -> DomHandle {
        self.open.last().copied().unwrap_or_else(DomHandle::root)
    }

    fn append(&mut self, node: DomNode) -> DomHandle {
        let parent = self.current();
        let handle = DomHandle(self.nodes.len());
        self.nodes.push(DomEntry {
            node,
            parent: Some(parent),
            len: 0,
        });
        if let DomNode::Container { children, .. } =
            &mut self.nodes[parent.0].node
        {
            children.push(handle);
        }
        handle
    }

    fn finish(mut self) -> EditableDom {
        // Children always sit after their parent in the arena, so a single
        // backwards pass sees every child before its parent.
        for i in (0..self.nodes.len()).rev() {
            let own = match &self.nodes[i].node {
                DomNode::Text(text) => text.chars().count(),
                DomNode::Atomic(_) => 1,
                DomNode::Container { .. } => 0,
            };
            self.nodes[i].len += own;
            if let Some(parent) = self.nodes[i].parent {
                self.nodes[parent.0].len += self.nodes[i].len;
            }
        }
        EditableDom { nodes: self.nodes }
    }
}

impl TokenSink for DomBuilder {
    fn text(&mut self, text: &str) {
        let parent = self.current();
        let last = self.nodes[parent.0]
            .node
            .children_last()
            .filter(|h| matches!(self.nodes[h.0].node, DomNode::Text(_)));
        match last {
            Some(handle) => {
                if let DomNode::Text(existing) = &mut self.nodes[handle.0].node {
                    existing.push_str(text);
                }
            }
            None => {
                self.append(DomNode::Text(text.to_owned()));
            }
        }
    }

    fn atomic(&mut self, embed: &EmbedAttributes) {
        self.append(DomNode::Atomic(embed.clone()));
    }

    fn enter(&mut self, kind: EntityKind, attributes: &Attributes) {
        let handle = self.append(DomNode::Container {
            format: Some((kind, attributes.clone())),
            children: Vec::new(),
        });
        self.open.push(handle);
    }

    fn exit(&mut self) {
        if self.open.len() > 1 {
            self.open.pop();
        }
    }
}

impl DomNode {
    fn children_last(&self) -> Option<DomHandle> {
        match self {
            DomNode::Container { children, .. } => children.last().copied(),
            DomNode::Text(_) | DomNode::Atomic(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_containers_with_lengths() {
        let dom = EditableDom::parse("ab<b>cd<i>e</i></b>");
        assert_eq!(dom.text_len(), 5);
        let root_children = dom.children(dom.root());
        assert_eq!(root_children.len(), 2);
        assert_eq!(dom.node_len(root_children[1]), 3);
    }

    #[test]
    fn embeds_count_as_one() {
        let dom = EditableDom::parse(r#"a<img alt="😀😀" data-document-id="1">b"#);
        assert_eq!(dom.text_len(), 3);
    }

    #[test]
    fn line_breaks_are_text() {
        let dom = EditableDom::parse("a<br>b");
        assert_eq!(dom.text_len(), 3);
        assert!(dom.find_text("a\nb").is_some());
    }

    #[test]
    fn edge_whitespace_is_kept() {
        let dom = EditableDom::parse("  a ");
        assert_eq!(dom.text_len(), 4);
    }

    #[test]
    fn inner_html_is_canonical() {
        let dom = EditableDom::parse("<strong>a</strong> &amp; <em>b</em>");
        assert_eq!(dom.inner_html(), "<b>a</b> &amp; <i>b</i>");
    }

    #[test]
    fn demoted_tag_merges_into_surrounding_text() {
        let dom = EditableDom::parse("<b>hi there");
        assert_eq!(dom.children(dom.root()).len(), 1);
        assert_eq!(dom.text_len(), "<b>hi there".len());
    }
}
