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

//! Read-only lookup tables between markup tags and entity kinds.

use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::entity::EntityKind;

/// Tags whose kind is fixed by the tag name alone.
static TAG_TO_KIND: Lazy<HashMap<&'static str, EntityKind>> =
    Lazy::new(|| {
        HashMap::from([
            ("b", EntityKind::Bold),
            ("strong", EntityKind::Bold),
            ("i", EntityKind::Italic),
            ("em", EntityKind::Italic),
            ("u", EntityKind::Underline),
            ("ins", EntityKind::Underline),
            ("s", EntityKind::Strike),
            ("strike", EntityKind::Strike),
            ("del", EntityKind::Strike),
            ("code", EntityKind::Code),
            ("pre", EntityKind::Pre),
            ("blockquote", EntityKind::Blockquote),
        ])
    });

/// Markdown delimiters, longest first so `**` wins over a lone `*`.
pub(crate) const MARKDOWN_DELIMITERS: [(&str, EntityKind); 5] = [
    ("**", EntityKind::Bold),
    ("__", EntityKind::Italic),
    ("~~", EntityKind::Strike),
    ("||", EntityKind::Spoiler),
    ("`", EntityKind::Code),
];

pub(crate) const SPOILER_CLASS: &str = "spoiler";
pub(crate) const VOID_TAGS: [&str; 6] = ["br", "img", "hr", "wbr", "meta", "input"];

pub(crate) fn kind_for_tag(tag: &str) -> Option<EntityKind> {
    TAG_TO_KIND.get(tag).copied()
}

/// Kind of an `<a>` or `<span>` element, which depends on its attributes.
pub(crate) fn kind_for_attributed_tag(
    tag: &str,
    attrs: &[(String, String)],
) -> Option<EntityKind> {
    let entity_type = attr(attrs, "data-entity-type")
        .and_then(|value| EntityKind::from_str(value).ok());
    match tag {
        "a" => match entity_type {
            Some(EntityKind::MentionName) => Some(EntityKind::MentionName),
            _ => Some(EntityKind::TextLink),
        },
        "span" => match entity_type {
            Some(EntityKind::MentionName) => Some(EntityKind::MentionName),
            Some(EntityKind::Spoiler) => Some(EntityKind::Spoiler),
            _ if has_class(attrs, SPOILER_CLASS) => Some(EntityKind::Spoiler),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

pub(crate) fn attr<'a>(
    attrs: &'a [(String, String)],
    name: &str,
) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _v)| n == name)
        .map(|(_n, v)| v.as_str())
}

fn has_class(attrs: &[(String, String)], class: &str) -> bool {
    attr(attrs, "class")
        .map(|v| v.split_ascii_whitespace().any(|c| c == class))
        .unwrap_or(false)
}
