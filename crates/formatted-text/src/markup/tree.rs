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

//! The annotation tree recovered from a token stream.
//!
//! Nodes are owned by one arena and refer to their children through
//! [`AnnotationHandle`]s. The arena may contain unreachable nodes (quote
//! lines merged into their predecessor); traversal always starts from
//! [`AnnotationTree::roots`].

use super::tokenizer::{EmbedAttributes, Token, Tokenizer};
use super::walker::{walk_tokens, TokenSink};
use super::{preprocess::preprocess, ParseOptions};
use crate::entity::{Attributes, EntityKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationHandle(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub kind: EntityKind,
    /// Offset of the first covered character.
    pub start: usize,
    /// Offset one past the last covered character.
    pub end: usize,
    pub attributes: Attributes,
    pub children: Vec<AnnotationHandle>,
}

impl Annotation {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationTree {
    nodes: Vec<Annotation>,
    roots: Vec<AnnotationHandle>,
    text: String,
    text_len: usize,
}

impl AnnotationTree {
    /// Preprocess, tokenize and build the tree for editor markup.
    pub fn parse(markup: &str, options: &ParseOptions) -> Self {
        let cleaned = preprocess(markup, options);
        let tokens = Tokenizer::new(options).tokenize(&cleaned);
        Self::from_tokens(&tokens)
    }

    /// Build the tree for an already tokenized stream.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut builder = TreeBuilder::default();
        walk_tokens(tokens, &mut builder);
        let mut tree = builder.finish();
        tree.merge_adjacent_quotes();

        #[cfg(feature = "assert-invariants")]
        tree.assert_invariants();

        tree
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the plain text in Unicode scalar values.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn roots(&self) -> &[AnnotationHandle] {
        &self.roots
    }

    pub fn get(&self, handle: AnnotationHandle) -> &Annotation {
        &self.nodes[handle.0]
    }

    /// Reachable annotations in pre-order: parent, its subtree, then the
    /// next sibling.
    pub fn iter_preorder(&self) -> impl Iterator<Item = &Annotation> + '_ {
        let mut stack: Vec<AnnotationHandle> =
            self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let handle = stack.pop()?;
            let node = self.get(handle);
            stack.extend(node.children.iter().rev().copied());
            Some(node)
        })
    }

    /// Merge sibling quotes that were split one-per-line by the markup.
    fn merge_adjacent_quotes(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let roots = std::mem::take(&mut self.roots);
        self.roots = merge_quotes(&mut self.nodes, roots, &chars);
    }

    /// Panic if a structural invariant of the tree does not hold.
    pub fn assert_invariants(&self) {
        fn check(
            tree: &AnnotationTree,
            siblings: &[AnnotationHandle],
            lo: usize,
            hi: usize,
        ) {
            let mut last_end = lo;
            for &handle in siblings {
                let node = tree.get(handle);
                assert!(
                    node.start <= node.end,
                    "annotation {node:?} ends before it starts"
                );
                assert!(
                    node.start >= last_end && node.end <= hi,
                    "annotation {node:?} escapes [{last_end}, {hi}]"
                );
                check(tree, &node.children, node.start, node.end);
                last_end = node.end;
            }
        }
        check(self, &self.roots, 0, self.text_len);
    }
}

fn merge_quotes(
    nodes: &mut [Annotation],
    siblings: Vec<AnnotationHandle>,
    chars: &[char],
) -> Vec<AnnotationHandle> {
    let mut merged: Vec<AnnotationHandle> = Vec::with_capacity(siblings.len());
    for handle in siblings {
        let children = std::mem::take(&mut nodes[handle.0].children);
        nodes[handle.0].children = merge_quotes(nodes, children, chars);

        if let Some(&prev) = merged.last() {
            if quotes_touch(&nodes[prev.0], &nodes[handle.0], chars) {
                let end = nodes[handle.0].end;
                let children = std::mem::take(&mut nodes[handle.0].children);
                let target = &mut nodes[prev.0];
                target.end = end;
                target.children.extend(children);
                continue;
            }
        }
        merged.push(handle);
    }
    merged
}

fn quotes_touch(prev: &Annotation, next: &Annotation, chars: &[char]) -> bool {
    prev.kind == EntityKind::Blockquote
        && next.kind == EntityKind::Blockquote
        && prev.attributes == next.attributes
        && (next.start == prev.end
            || (next.start == prev.end + 1
                && chars.get(prev.end) == Some(&'\n')))
}

struct Frame {
    kind: EntityKind,
    attributes: Attributes,
    start: usize,
    children: Vec<AnnotationHandle>,
}

#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<Annotation>,
    roots: Vec<AnnotationHandle>,
    stack: Vec<Frame>,
    text: String,
    len: usize,
}

impl TreeBuilder {
    fn attach(&mut self, node: Annotation) {
        let handle = AnnotationHandle(self.nodes.len());
        self.nodes.push(node);
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(handle),
            None => self.roots.push(handle),
        }
    }

    fn finish(self) -> AnnotationTree {
        AnnotationTree {
            nodes: self.nodes,
            roots: self.roots,
            text: self.text,
            text_len: self.len,
        }
    }
}

impl TokenSink for TreeBuilder {
    fn text(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }

    fn atomic(&mut self, embed: &EmbedAttributes) {
        let start = self.len;
        self.text(embed.placeholder());
        if let Some(document_id) = &embed.document_id {
            self.attach(Annotation {
                kind: EntityKind::CustomEmoji,
                start,
                end: self.len,
                attributes: Attributes::DocumentId(document_id.clone()),
                children: Vec::new(),
            });
        }
    }

    fn enter(&mut self, kind: EntityKind, attributes: &Attributes) {
        self.stack.push(Frame {
            kind,
            attributes: attributes.clone(),
            start: self.len,
            children: Vec::new(),
        });
    }

    fn exit(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.attach(Annotation {
                kind: frame.kind,
                start: frame.start,
                end: self.len,
                attributes: frame.attributes,
                children: frame.children,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> AnnotationTree {
        let tree = AnnotationTree::parse(markup, &ParseOptions::default());
        tree.assert_invariants();
        tree
    }

    fn summary(tree: &AnnotationTree) -> Vec<(EntityKind, usize, usize)> {
        tree.iter_preorder()
            .map(|a| (a.kind, a.start, a.end))
            .collect()
    }

    #[test]
    fn text_and_offsets_are_accumulated() {
        let tree = parse("<b>hi</b> there");
        assert_eq!(tree.text(), "hi there");
        assert_eq!(summary(&tree), vec![(EntityKind::Bold, 0, 2)]);
    }

    #[test]
    fn children_are_nested_under_their_parent() {
        let tree = parse("a<b>b<i>cd</i>e</b>");
        assert_eq!(tree.text(), "abcde");
        assert_eq!(
            summary(&tree),
            vec![(EntityKind::Bold, 1, 5), (EntityKind::Italic, 2, 4)]
        );
        let bold = tree.get(tree.roots()[0]);
        assert_eq!(bold.children.len(), 1);
    }

    #[test]
    fn unbalanced_tag_is_kept_as_literal_text() {
        let tree = parse("<b>hi there");
        assert_eq!(tree.text(), "<b>hi there");
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn custom_emoji_is_a_leaf_over_its_placeholder() {
        let tree = parse(
            r#"hi <img alt="😀" data-document-id="5" data-entity-type="MessageEntityCustomEmoji">"#,
        );
        assert_eq!(tree.text(), "hi 😀");
        assert_eq!(summary(&tree), vec![(EntityKind::CustomEmoji, 3, 4)]);
        assert_eq!(
            tree.get(tree.roots()[0]).attributes,
            Attributes::DocumentId("5".into())
        );
    }

    #[test]
    fn image_without_document_id_is_only_text() {
        let tree = parse(r#"<img alt="x">"#);
        assert_eq!(tree.text(), "x");
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn quote_lines_merge_into_one_blockquote() {
        let tree = parse("> a\n> b");
        assert_eq!(tree.text(), "a\nb");
        assert_eq!(summary(&tree), vec![(EntityKind::Blockquote, 0, 3)]);
    }

    #[test]
    fn quote_run_keeps_formatting_of_every_line() {
        let tree = parse("> **a**\n> __b__");
        assert_eq!(
            summary(&tree),
            vec![
                (EntityKind::Blockquote, 0, 3),
                (EntityKind::Bold, 0, 1),
                (EntityKind::Italic, 2, 3),
            ]
        );
    }

    #[test]
    fn merged_quote_keeps_children_of_every_line() {
        let tree = parse(
            "<blockquote><b>a</b></blockquote>\n<blockquote><i>b</i></blockquote>",
        );
        assert_eq!(
            summary(&tree),
            vec![
                (EntityKind::Blockquote, 0, 3),
                (EntityKind::Bold, 0, 1),
                (EntityKind::Italic, 2, 3),
            ]
        );
    }

    #[test]
    fn separated_quotes_stay_apart() {
        let tree = parse("> a\nx\n> b");
        assert_eq!(
            summary(&tree),
            vec![(EntityKind::Blockquote, 0, 1), (EntityKind::Blockquote, 4, 5)]
        );
    }

    #[test]
    fn quotes_with_different_collapse_flags_stay_apart() {
        let tree = parse(
            r#"<blockquote data-can-collapse="true">a</blockquote><blockquote>b</blockquote>"#,
        );
        assert_eq!(tree.roots().len(), 2);
    }
}
