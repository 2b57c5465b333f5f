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

//! Conversion between tree positions and absolute character offsets.

use super::{DomHandle, DomNode, DomPosition, DomRange, EditableDom};
use crate::markup::MAX_RECURSION_DEPTH;

/// Which end of a selection a position describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Absolute offset of `position`, counting every character before it.
///
/// A position placed on an embed itself refers to the boundary before the
/// embed, or after it when `edge` is [`Edge::End`].
pub fn to_absolute_offset(
    dom: &EditableDom,
    position: DomPosition,
    edge: Edge,
) -> usize {
    let mut offset = match dom.node(position.node) {
        DomNode::Text(text) => position.offset.min(text.chars().count()),
        DomNode::Container { children, .. } => children
            [..position.offset.min(children.len())]
            .iter()
            .map(|&child| dom.node_len(child))
            .sum(),
        DomNode::Atomic(_) => match edge {
            Edge::Start => 0,
            Edge::End => 1,
        },
    };

    let mut node = position.node;
    let mut depth = 0;
    // Containers nest at most MAX_RECURSION_DEPTH deep, with one more
    // level for the leaf inside the deepest one.
    while let Some(parent) = dom.parent(node) {
        if depth > MAX_RECURSION_DEPTH {
            tracing::warn!(depth, "Max recursion depth reached");
            break;
        }
        depth += 1;
        offset += dom
            .children(parent)
            .iter()
            .take_while(|&&sibling| sibling != node)
            .map(|&sibling| dom.node_len(sibling))
            .sum::<usize>();
        node = parent;
    }
    offset
}

/// The tree position at absolute `offset`.
///
/// Offsets inside a text node resolve into that node; an offset just before
/// an embed resolves to the boundary in the embed's parent; the total length
/// resolves to the end of the last leaf. Offsets past the end resolve to the
/// start of the root.
pub fn to_dom_position(dom: &EditableDom, offset: usize) -> DomPosition {
    let mut seen = 0;
    if let Some(found) = find_position(dom, dom.root(), offset, &mut seen, 0)
    {
        return found;
    }
    if offset == seen {
        if let Some(end) = end_of_last_leaf(dom) {
            return end;
        }
    } else {
        tracing::warn!(offset, len = seen, "Offset is outside the tree");
    }
    DomPosition::new(dom.root(), 0)
}

/// Inclusive `(start, end)` character offsets covered by `range`, or `None`
/// when the range selects nothing.
pub fn selection_offsets(
    dom: &EditableDom,
    range: &DomRange,
) -> Option<(usize, usize)> {
    let start = to_absolute_offset(dom, range.start, Edge::Start);
    let end = to_absolute_offset(dom, range.end, Edge::End);
    (end > start).then(|| (start, end - 1))
}

/// The range covering the inclusive offsets `start..=end`.
pub fn range_for_offsets(dom: &EditableDom, start: usize, end: usize) -> DomRange {
    DomRange::new(to_dom_position(dom, start), to_dom_position(dom, end + 1))
}

fn find_position(
    dom: &EditableDom,
    handle: DomHandle,
    offset: usize,
    seen: &mut usize,
    depth: usize,
) -> Option<DomPosition> {
    if depth > MAX_RECURSION_DEPTH {
        tracing::warn!(depth, "Max recursion depth reached");
        *seen += dom.node_len(handle);
        return None;
    }
    for (index, &child) in dom.children(handle).iter().enumerate() {
        match dom.node(child) {
            DomNode::Text(text) => {
                let len = text.chars().count();
                if *seen <= offset && offset < *seen + len {
                    return Some(DomPosition::new(child, offset - *seen));
                }
                *seen += len;
            }
            DomNode::Atomic(_) => {
                if offset == *seen {
                    return Some(DomPosition::new(handle, index));
                }
                *seen += 1;
            }
            DomNode::Container { .. } => {
                let found = find_position(dom, child, offset, seen, depth + 1);
                if found.is_some() {
                    return found;
                }
            }
        }
    }
    None
}

fn end_of_last_leaf(dom: &EditableDom) -> Option<DomPosition> {
    let mut handle = dom.root();
    loop {
        let children = dom.children(handle);
        let &last = children.last()?;
        match dom.node(last) {
            DomNode::Text(text) => {
                return Some(DomPosition::new(last, text.chars().count()))
            }
            DomNode::Atomic(_) => {
                return Some(DomPosition::new(handle, children.len()))
            }
            DomNode::Container { .. } => handle = last,
        }
    }
}
