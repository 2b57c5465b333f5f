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

//! Scans composer markup into a flat token stream.
//!
//! HTML tags are recognised through the static tag table; inline markdown
//! delimiters are recognised only when a matching close delimiter exists
//! further on and nests inside every delimiter that is still open. Tags
//! that carry no formatting (`div`, plain `span`, ...) are dropped while
//! their content is kept.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::tag_table::{
    attr, is_void, kind_for_attributed_tag, kind_for_tag, MARKDOWN_DELIMITERS,
};
use super::ParseOptions;
use crate::entity::{Attributes, EntityKind};

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .unwrap()
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .unwrap()
});
static CODE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:code|pre)\b[^>]*>").unwrap());

/// Attributes of an embedded image (custom emoji).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EmbedAttributes {
    pub src: String,
    pub alt: String,
    pub class: Option<String>,
    pub draggable: bool,
    pub document_id: Option<String>,
    pub unique_id: Option<String>,
    pub entity_type: Option<String>,
}

impl EmbedAttributes {
    fn from_attrs(attrs: &[(String, String)]) -> Self {
        let owned = |name: &str| {
            attr(attrs, name)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Self {
            src: attr(attrs, "src").unwrap_or_default().to_owned(),
            alt: attr(attrs, "alt").unwrap_or_default().to_owned(),
            class: owned("class"),
            draggable: attr(attrs, "draggable") == Some("true"),
            document_id: owned("data-document-id"),
            unique_id: owned("data-unique-id"),
            entity_type: owned("data-entity-type"),
        }
    }

    /// The text this embed stands for in flattened output.
    pub fn placeholder(&self) -> &str {
        if self.alt.is_empty() {
            super::OBJECT_REPLACEMENT
        } else {
            &self.alt
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// A run of text, still HTML-escaped.
    Text(String),
    OpenTag {
        kind: EntityKind,
        attributes: Attributes,
        /// Source form, used if the tag has to be demoted to text.
        raw: String,
    },
    CloseTag {
        kind: EntityKind,
        raw: String,
    },
    Atomic {
        kind: EntityKind,
        embed: EmbedAttributes,
    },
}

/// A tag as written in the source, before any interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawTag {
    pub(crate) name: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) closing: bool,
    pub(crate) self_closing: bool,
}

/// Try to read a tag at the start of `input`; returns the tag and the
/// number of bytes it spans.
pub(crate) fn scan_tag(input: &str) -> Option<(RawTag, usize)> {
    let caps = TAG.captures(input)?;
    let whole = caps.get(0)?;
    let attrs = ATTRIBUTE
        .captures_iter(caps.get(3).map_or("", |m| m.as_str()))
        .map(|a| {
            let name = a[1].to_ascii_lowercase();
            let value = a
                .get(2)
                .or_else(|| a.get(3))
                .or_else(|| a.get(4))
                .map_or("", |m| m.as_str());
            (name, html_escape::decode_html_entities(value).into_owned())
        })
        .collect();
    Some((
        RawTag {
            name: caps[2].to_ascii_lowercase(),
            attrs,
            closing: !caps[1].is_empty(),
            self_closing: !caps[4].is_empty(),
        },
        whole.end(),
    ))
}

/// Length of an HTML comment at the start of `input`, if there is one.
pub(crate) fn scan_comment(input: &str) -> Option<usize> {
    let body = input.strip_prefix("<!--")?;
    Some(body.find("-->").map_or(input.len(), |end| end + 4 + 3))
}

fn attributes_for(kind: EntityKind, attrs: &[(String, String)]) -> Attributes {
    match kind {
        EntityKind::TextLink => {
            Attributes::Url(attr(attrs, "href").unwrap_or_default().to_owned())
        }
        EntityKind::Pre => Attributes::Language(
            attr(attrs, "data-language")
                .filter(|lang| !lang.is_empty())
                .map(str::to_owned),
        ),
        EntityKind::Blockquote => Attributes::CanCollapse(
            attr(attrs, "data-can-collapse") == Some("true"),
        ),
        EntityKind::MentionName => Attributes::UserId(
            attr(attrs, "data-user-id").unwrap_or_default().to_owned(),
        ),
        EntityKind::CustomEmoji => Attributes::DocumentId(
            attr(attrs, "data-document-id").unwrap_or_default().to_owned(),
        ),
        _ => Attributes::None,
    }
}

/// A markdown span that has been opened and whose close position is known.
struct OpenDelimiter {
    kind: EntityKind,
    delimiter: &'static str,
    close_at: usize,
}

pub struct Tokenizer {
    skip_markdown: bool,
    trim_edges: bool,
}

impl Tokenizer {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            skip_markdown: options.skip_markdown,
            trim_edges: true,
        }
    }

    /// Whether whitespace at the very start and end of the stream is
    /// trimmed. On by default.
    pub fn trim_edges(mut self, trim: bool) -> Self {
        self.trim_edges = trim;
        self
    }

    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut state = ScanState::default();
        let mut pos = 0;

        while pos < input.len() {
            let rest = &input[pos..];

            if let Some(idx) =
                state.open_md.iter().rposition(|open| open.close_at == pos)
            {
                let open = state.open_md.remove(idx);
                state.push(Token::CloseTag {
                    kind: open.kind,
                    raw: open.delimiter.to_owned(),
                });
                pos += open.delimiter.len();
                continue;
            }

            if rest.starts_with('<') {
                if let Some(len) = scan_comment(rest) {
                    pos += len;
                    continue;
                }
                if let Some((tag, len)) = scan_tag(rest) {
                    state.push_tag(tag, &rest[..len]);
                    pos += len;
                    continue;
                }
            }

            if !self.skip_markdown && !state.in_code() {
                if let Some(&(delimiter, kind)) = MARKDOWN_DELIMITERS
                    .iter()
                    .find(|(d, _)| rest.starts_with(d))
                {
                    if let Some(close_at) =
                        state.find_markdown_close(input, pos, delimiter)
                    {
                        state.push(Token::OpenTag {
                            kind,
                            attributes: Attributes::default_for(kind),
                            raw: delimiter.to_owned(),
                        });
                        state.open_md.push(OpenDelimiter {
                            kind,
                            delimiter,
                            close_at,
                        });
                    } else {
                        state.text.push_str(delimiter);
                    }
                    pos += delimiter.len();
                    continue;
                }
            }

            if let Some(c) = rest.chars().next() {
                state.text.push(c);
                pos += c.len_utf8();
            }
        }

        let mut tokens = state.finish();
        if self.trim_edges {
            trim_stream_edges(&mut tokens);
        }
        tokens
    }
}

/// Tokenize with the default settings for `options`.
pub fn tokenize(markup: &str, options: &ParseOptions) -> Vec<Token> {
    Tokenizer::new(options).tokenize(markup)
}

#[derive(Default)]
struct ScanState {
    tokens: Vec<Token>,
    text: String,
    open_md: Vec<OpenDelimiter>,
    /// Number of open HTML `code` and `pre` elements.
    code_depth: usize,
    /// For tags whose kind depends on attributes, the kinds of currently
    /// open elements so the matching close tag resolves the same way.
    attributed: HashMap<String, Vec<Option<EntityKind>>>,
}

impl ScanState {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.tokens.push(Token::Text(std::mem::take(&mut self.text)));
        }
    }

    fn push(&mut self, token: Token) {
        self.flush_text();
        self.tokens.push(token);
    }

    /// Inside code, markdown delimiters are literal text.
    fn in_code(&self) -> bool {
        self.code_depth > 0
            || self.open_md.iter().any(|open| open.kind == EntityKind::Code)
    }

    /// Close position for a delimiter opening at `pos`: the next occurrence
    /// with non-empty content, which must fall inside the innermost open
    /// markdown span and before any HTML code element.
    fn find_markdown_close(
        &self,
        input: &str,
        pos: usize,
        delimiter: &str,
    ) -> Option<usize> {
        let from = pos + delimiter.len();
        let rest = input.get(from..)?;
        let close_at = from + rest.find(delimiter)?;
        if close_at == from {
            return None;
        }
        if let Some(code) = CODE_BOUNDARY.find(rest) {
            if close_at >= from + code.start() {
                return None;
            }
        }
        match self.open_md.last() {
            Some(innermost) if close_at >= innermost.close_at => None,
            _ => Some(close_at),
        }
    }

    fn push_tag(&mut self, tag: RawTag, raw: &str) {
        match tag.name.as_str() {
            "br" => self.text.push('\n'),
            "img" if !tag.closing => {
                self.push(Token::Atomic {
                    kind: EntityKind::CustomEmoji,
                    embed: EmbedAttributes::from_attrs(&tag.attrs),
                });
            }
            "a" | "span" => self.push_attributed_tag(tag, raw),
            name => match kind_for_tag(name) {
                Some(_) if tag.self_closing => {}
                Some(kind) if tag.closing => {
                    if is_code(kind) {
                        self.code_depth = self.code_depth.saturating_sub(1);
                    }
                    self.push(Token::CloseTag {
                        kind,
                        raw: raw.to_owned(),
                    })
                }
                Some(kind) => {
                    if is_code(kind) {
                        self.code_depth += 1;
                    }
                    self.push(Token::OpenTag {
                        kind,
                        attributes: attributes_for(kind, &tag.attrs),
                        raw: raw.to_owned(),
                    })
                }
                None => {
                    if !is_void(name) {
                        tracing::debug!(tag = name, "Dropping unknown tag");
                    }
                }
            },
        }
    }

    fn push_attributed_tag(&mut self, tag: RawTag, raw: &str) {
        if tag.self_closing {
            return;
        }
        let stack = self.attributed.entry(tag.name.clone()).or_default();
        if tag.closing {
            let kind = match stack.pop() {
                Some(kind) => kind,
                // Stray close: let the tree builder decide what to do.
                None => kind_for_attributed_tag(&tag.name, &[]),
            };
            if let Some(kind) = kind {
                self.push(Token::CloseTag {
                    kind,
                    raw: raw.to_owned(),
                });
            }
        } else {
            let kind = kind_for_attributed_tag(&tag.name, &tag.attrs);
            stack.push(kind);
            if let Some(kind) = kind {
                self.push(Token::OpenTag {
                    kind,
                    attributes: attributes_for(kind, &tag.attrs),
                    raw: raw.to_owned(),
                });
            }
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.flush_text();
        self.tokens
    }
}

fn is_code(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::Code | EntityKind::Pre)
}

fn trim_stream_edges(tokens: &mut Vec<Token>) {
    if let Some(Token::Text(text)) = tokens.first_mut() {
        *text = text.trim_start().to_owned();
        if text.is_empty() {
            tokens.remove(0);
        }
    }
    if let Some(Token::Text(text)) = tokens.last_mut() {
        *text = text.trim_end().to_owned();
        if text.is_empty() {
            tokens.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(input: &str) -> Vec<Token> {
        Tokenizer::new(&ParseOptions::default().skip_markdown(true))
            .tokenize(input)
    }

    fn md(input: &str) -> Vec<Token> {
        tokenize(input, &ParseOptions::default())
    }

    fn text(s: &str) -> Token {
        Token::Text(s.to_owned())
    }

    fn open(kind: EntityKind, raw: &str) -> Token {
        Token::OpenTag {
            kind,
            attributes: Attributes::default_for(kind),
            raw: raw.to_owned(),
        }
    }

    fn close(kind: EntityKind, raw: &str) -> Token {
        Token::CloseTag {
            kind,
            raw: raw.to_owned(),
        }
    }

    #[test]
    fn html_tags_become_open_and_close_tokens() {
        assert_eq!(
            html("<b>hi</b> there"),
            vec![
                open(EntityKind::Bold, "<b>"),
                text("hi"),
                close(EntityKind::Bold, "</b>"),
                text(" there"),
            ]
        );
    }

    #[test]
    fn link_href_is_captured_and_decoded() {
        let tokens = html(r#"<a href="https://x.y/?a=1&amp;b=2">l</a>"#);
        assert_eq!(
            tokens[0],
            Token::OpenTag {
                kind: EntityKind::TextLink,
                attributes: Attributes::Url("https://x.y/?a=1&b=2".into()),
                raw: r#"<a href="https://x.y/?a=1&amp;b=2">"#.into(),
            }
        );
        assert_eq!(tokens[2], close(EntityKind::TextLink, "</a>"));
    }

    #[test]
    fn image_is_a_single_atomic_token() {
        let tokens = html(
            r#"a<img src="e.png" alt="😀" data-document-id="42" data-entity-type="MessageEntityCustomEmoji">b"#,
        );
        assert_eq!(tokens.len(), 3);
        let Token::Atomic { kind, ref embed } = tokens[1] else {
            panic!("expected an atomic token, got {:?}", tokens[1]);
        };
        assert_eq!(kind, EntityKind::CustomEmoji);
        assert_eq!(embed.alt, "😀");
        assert_eq!(embed.document_id.as_deref(), Some("42"));
        assert_eq!(embed.src, "e.png");
    }

    #[test]
    fn unknown_tags_and_plain_spans_are_transparent() {
        assert_eq!(
            html("<p>a<span>b</span>c</p>"),
            vec![text("abc")]
        );
    }

    #[test]
    fn spoiler_span_closes_as_spoiler() {
        assert_eq!(
            html(r#"<span class="spoiler">x<span>y</span></span>"#),
            vec![
                open(EntityKind::Spoiler, r#"<span class="spoiler">"#),
                text("xy"),
                close(EntityKind::Spoiler, "</span>"),
            ]
        );
    }

    #[test]
    fn edge_whitespace_is_trimmed_but_interior_kept() {
        assert_eq!(
            html("  <i> a  b </i>  "),
            vec![
                open(EntityKind::Italic, "<i>"),
                text(" a  b "),
                close(EntityKind::Italic, "</i>"),
            ]
        );
    }

    #[test]
    fn untrimmed_mode_keeps_edges() {
        let tokens = Tokenizer::new(&ParseOptions::default())
            .trim_edges(false)
            .tokenize(" a ");
        assert_eq!(tokens, vec![text(" a ")]);
    }

    #[test]
    fn markdown_delimiters_are_recognised() {
        assert_eq!(
            md("a **b** c"),
            vec![
                text("a "),
                open(EntityKind::Bold, "**"),
                text("b"),
                close(EntityKind::Bold, "**"),
                text(" c"),
            ]
        );
    }

    #[test]
    fn unmatched_markdown_is_literal() {
        assert_eq!(md("a ** b"), vec![text("a ** b")]);
        assert_eq!(md("****"), vec![text("****")]);
    }

    #[test]
    fn markdown_is_ignored_when_skipped() {
        assert_eq!(html("**b**"), vec![text("**b**")]);
    }

    #[test]
    fn crossing_markdown_spans_are_not_opened() {
        assert_eq!(
            md("**a __b** c__"),
            vec![
                open(EntityKind::Bold, "**"),
                text("a __b"),
                close(EntityKind::Bold, "**"),
                text(" c__"),
            ]
        );
    }

    #[test]
    fn no_markdown_inside_code_spans() {
        assert_eq!(
            md("`**x**`"),
            vec![
                open(EntityKind::Code, "`"),
                text("**x**"),
                close(EntityKind::Code, "`"),
            ]
        );
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        assert_eq!(html("a < b"), vec![text("a < b")]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(html("a<!-- x -->b"), vec![text("ab")]);
    }

    #[test]
    fn delimiters_inside_html_code_are_literal() {
        assert_eq!(
            md("<code>a__b__c</code>"),
            vec![
                open(EntityKind::Code, "<code>"),
                text("a__b__c"),
                close(EntityKind::Code, "</code>"),
            ]
        );
        assert_eq!(md("<pre>x**2 + y**2</pre>")[1], text("x**2 + y**2"));
    }

    #[test]
    fn delimiter_does_not_close_inside_a_later_code_element() {
        assert_eq!(
            md("**a <code>b**</code>"),
            vec![
                text("**a "),
                open(EntityKind::Code, "<code>"),
                text("b**"),
                close(EntityKind::Code, "</code>"),
            ]
        );
    }
}
