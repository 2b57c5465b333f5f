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

//! Canonical markup for entities.
//!
//! The same tag shapes are written by [`FormattedText::to_html`] and by the
//! format applicator, so markup produced by either reads back through the
//! parser to the same entities.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::tag_table::SPOILER_CLASS;
use super::tokenizer::EmbedAttributes;
use crate::entity::{Attributes, Entity, EntityKind, FormattedText};

pub(crate) const CODE_CLASS: &str = "text-entity-code";
pub(crate) const LINK_CLASS: &str = "text-entity-link";

/// Append the canonical opening tag for `kind` to `out`.
pub(crate) fn write_open_tag(
    out: &mut String,
    kind: EntityKind,
    attributes: &Attributes,
) {
    match (kind, attributes) {
        (EntityKind::Bold, _) => out.push_str("<b>"),
        (EntityKind::Italic, _) => out.push_str("<i>"),
        (EntityKind::Underline, _) => out.push_str("<u>"),
        (EntityKind::Strike, _) => out.push_str("<del>"),
        (EntityKind::Code, _) => {
            out.push_str(&format!(
                "<code class=\"{CODE_CLASS}\" dir=\"auto\">"
            ));
        }
        (EntityKind::Pre, Attributes::Language(Some(language)))
            if !language.is_empty() =>
        {
            out.push_str(&format!(
                "<pre data-language=\"{}\">",
                encode_double_quoted_attribute(language)
            ));
        }
        (EntityKind::Pre, _) => out.push_str("<pre>"),
        (EntityKind::Blockquote, attributes) => {
            let can_collapse =
                matches!(attributes, Attributes::CanCollapse(true));
            out.push_str(&format!(
                "<blockquote data-can-collapse=\"{can_collapse}\">"
            ));
        }
        (EntityKind::TextLink, attributes) => {
            let url = match attributes {
                Attributes::Url(url) => url.as_str(),
                _ => "",
            };
            out.push_str(&format!(
                "<a class=\"{LINK_CLASS}\" dir=\"auto\" href=\"{}\">",
                encode_double_quoted_attribute(url)
            ));
        }
        (EntityKind::Spoiler, _) => {
            out.push_str(&format!(
                "<span class=\"{SPOILER_CLASS}\" data-entity-type=\"{}\">",
                EntityKind::Spoiler
            ));
        }
        (EntityKind::MentionName, attributes) => {
            let user_id = match attributes {
                Attributes::UserId(id) => id.as_str(),
                _ => "",
            };
            out.push_str(&format!(
                "<a data-entity-type=\"{}\" data-user-id=\"{}\">",
                EntityKind::MentionName,
                encode_double_quoted_attribute(user_id)
            ));
        }
        // Embeds are written whole by `write_embed`.
        (EntityKind::CustomEmoji, _) => {}
    }
}

pub(crate) fn write_close_tag(out: &mut String, kind: EntityKind) {
    out.push_str(match kind {
        EntityKind::Bold => "</b>",
        EntityKind::Italic => "</i>",
        EntityKind::Underline => "</u>",
        EntityKind::Strike => "</del>",
        EntityKind::Code => "</code>",
        EntityKind::Pre => "</pre>",
        EntityKind::Blockquote => "</blockquote>",
        EntityKind::TextLink | EntityKind::MentionName => "</a>",
        EntityKind::Spoiler => "</span>",
        EntityKind::CustomEmoji => "",
    });
}

/// Append an `<img>` for an embed, keeping every attribute it came with.
pub(crate) fn write_embed(out: &mut String, embed: &EmbedAttributes) {
    let attr = |value: &str| encode_double_quoted_attribute(value).into_owned();
    out.push_str(&format!(
        "<img src=\"{}\" alt=\"{}\"",
        attr(&embed.src),
        attr(&embed.alt)
    ));
    if let Some(class) = &embed.class {
        out.push_str(&format!(" class=\"{}\"", attr(class)));
    }
    out.push_str(&format!(" draggable=\"{}\"", embed.draggable));
    for (name, value) in [
        ("data-document-id", &embed.document_id),
        ("data-unique-id", &embed.unique_id),
        ("data-entity-type", &embed.entity_type),
    ] {
        if let Some(value) = value {
            out.push_str(&format!(" {name}=\"{}\"", attr(value)));
        }
    }
    out.push('>');
}

/// Append escaped text, with line breaks as `<br>`.
pub(crate) fn write_text(out: &mut String, text: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(&encode_text(first));
    }
    for line in lines {
        out.push_str("<br>");
        out.push_str(&encode_text(line));
    }
}

/// Render plain text and entities as composer markup.
///
/// Entities are expected not to cross; one that reaches past its enclosing
/// entity is clipped to it.
pub fn render_formatted_text(formatted: &FormattedText) -> String {
    let chars: Vec<char> = formatted.text.chars().collect();
    let mut order: Vec<&Entity> = formatted
        .entities
        .iter()
        .filter(|e| e.length > 0 && e.offset < chars.len())
        .collect();
    order.sort_by(|a, b| {
        a.offset.cmp(&b.offset).then(b.length.cmp(&a.length))
    });

    let mut out = String::with_capacity(formatted.text.len());
    // (kind, end) of currently open entities, innermost last.
    let mut open: Vec<(EntityKind, usize)> = Vec::new();
    let mut pending = order.into_iter().peekable();
    let mut run = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        let boundary = open.last().is_some_and(|&(_, end)| end == pos)
            || pending.peek().is_some_and(|e| e.offset == pos);
        if boundary {
            write_text(&mut out, &std::mem::take(&mut run));
        }
        while let Some(&(kind, end)) = open.last() {
            if end > pos {
                break;
            }
            write_close_tag(&mut out, kind);
            open.pop();
        }

        let mut skip_to = None;
        while let Some(entity) = pending.next_if(|e| e.offset == pos) {
            let limit = open.last().map_or(chars.len(), |&(_, end)| end);
            let end = entity.end().min(limit);
            if entity.kind == EntityKind::CustomEmoji {
                let alt: String = chars[pos..end].iter().collect();
                write_embed(
                    &mut out,
                    &EmbedAttributes {
                        alt,
                        document_id: entity.document_id.clone(),
                        entity_type: Some(EntityKind::CustomEmoji.to_string()),
                        ..EmbedAttributes::default()
                    },
                );
                skip_to = Some(end);
                break;
            }
            write_open_tag(&mut out, entity.kind, &entity.attributes());
            open.push((entity.kind, end));
        }

        match skip_to {
            Some(end) => {
                while pending.next_if(|e| e.offset < end).is_some() {}
                pos = end;
            }
            None => {
                run.push(chars[pos]);
                pos += 1;
            }
        }
    }

    write_text(&mut out, &run);
    while let Some((kind, _)) = open.pop() {
        write_close_tag(&mut out, kind);
    }
    out
}
