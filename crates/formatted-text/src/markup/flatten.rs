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

use super::tree::{AnnotationHandle, AnnotationTree};
use crate::entity::{Entity, FormattedText};

/// Walk `tree` in pre-order, emitting one entity per non-empty annotation.
///
/// Empty annotations are dropped together with their subtree.
pub fn flatten(tree: &AnnotationTree) -> FormattedText {
    let mut entities = Vec::new();
    let mut stack: Vec<AnnotationHandle> =
        tree.roots().iter().rev().copied().collect();
    while let Some(handle) = stack.pop() {
        let node = tree.get(handle);
        if node.is_empty() {
            continue;
        }
        entities.push(Entity::from_annotation(
            node.kind,
            node.start,
            node.len(),
            &node.attributes,
        ));
        stack.extend(node.children.iter().rev().copied());
    }
    FormattedText::new(tree.text(), entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::markup::ParseOptions;

    fn flat(markup: &str) -> FormattedText {
        flatten(&AnnotationTree::parse(markup, &ParseOptions::default()))
    }

    fn kinds(text: &FormattedText) -> Vec<(EntityKind, usize, usize)> {
        text.entities
            .iter()
            .map(|e| (e.kind, e.offset, e.length))
            .collect()
    }

    #[test]
    fn parent_precedes_subtree_precedes_sibling() {
        let text = flat("<b>a<i>b</i></b><u>c</u>");
        assert_eq!(
            kinds(&text),
            vec![
                (EntityKind::Bold, 0, 2),
                (EntityKind::Italic, 1, 1),
                (EntityKind::Underline, 2, 1),
            ]
        );
    }

    #[test]
    fn empty_annotations_are_dropped() {
        let text = flat("a<b><i></i></b>b");
        assert_eq!(text.text, "ab");
        assert!(text.entities.is_empty());
    }

    #[test]
    fn kind_specific_fields_are_populated() {
        let text = flat(
            r#"<a href="https://x.y">l</a> <pre data-language="">c</pre> <blockquote>q</blockquote>"#,
        );
        assert_eq!(text.entities[0].url.as_deref(), Some("https://x.y"));
        assert_eq!(text.entities[1].language, None);
        assert_eq!(text.entities[2].can_collapse, Some(false));
    }

    #[test]
    fn mention_carries_user_id() {
        let text = flat(
            r#"hey <a data-entity-type="MessageEntityMentionName" data-user-id="777">Bob</a>"#,
        );
        assert_eq!(text.entities[0].kind, EntityKind::MentionName);
        assert_eq!(text.entities[0].user_id.as_deref(), Some("777"));
        assert_eq!((text.entities[0].offset, text.entities[0].length), (4, 3));
    }

    #[test]
    fn entities_stay_inside_the_text() {
        let text = flat("**a __b__** ~~c~~ ||d|| `e`");
        let len = text.text_len();
        assert_eq!(text.text, "a b c d e");
        for entity in &text.entities {
            assert!(entity.length > 0);
            assert!(entity.end() <= len);
        }
        assert_eq!(text.entities.len(), 5);
    }
}
