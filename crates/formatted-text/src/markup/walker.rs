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

//! Balanced traversal of a token stream.
//!
//! Both the annotation tree and the per-character model are built from the
//! same walk, so they agree on which tags pair up and which are demoted to
//! literal text.

use std::collections::HashMap;

use super::tokenizer::{EmbedAttributes, Token};
use super::MAX_RECURSION_DEPTH;
use crate::entity::{Attributes, EntityKind};

/// Receives the structure recovered from a token stream.
pub(crate) trait TokenSink {
    /// Decoded text, or the raw source of a demoted tag.
    fn text(&mut self, text: &str);
    fn atomic(&mut self, embed: &EmbedAttributes);
    fn enter(&mut self, kind: EntityKind, attributes: &Attributes);
    fn exit(&mut self);
}

/// Drive `sink` over `tokens`, pairing each open tag with its balanced
/// close tag of the same kind.
pub(crate) fn walk_tokens<S: TokenSink>(tokens: &[Token], sink: &mut S) {
    let pairs = match_pairs(tokens);
    walk_range(tokens, &pairs, 0, tokens.len(), 0, sink);
}

/// For every open tag, the index of the close tag that balances it.
fn match_pairs(tokens: &[Token]) -> Vec<Option<usize>> {
    let mut pairs = vec![None; tokens.len()];
    let mut open: HashMap<EntityKind, Vec<usize>> = HashMap::new();
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::OpenTag { kind, .. } => open.entry(*kind).or_default().push(i),
            Token::CloseTag { kind, .. } => {
                if let Some(start) = open.get_mut(kind).and_then(Vec::pop) {
                    pairs[start] = Some(i);
                }
            }
            _ => {}
        }
    }
    pairs
}

fn walk_range<S: TokenSink>(
    tokens: &[Token],
    pairs: &[Option<usize>],
    lo: usize,
    hi: usize,
    depth: usize,
    sink: &mut S,
) {
    if depth >= MAX_RECURSION_DEPTH {
        tracing::warn!(depth, "Max recursion depth reached, flushing as text");
        flush_as_text(&tokens[lo..hi], sink);
        return;
    }

    let mut i = lo;
    while i < hi {
        match &tokens[i] {
            Token::Text(text) => {
                sink.text(&html_escape::decode_html_entities(text));
            }
            Token::Atomic { embed, .. } => sink.atomic(embed),
            Token::OpenTag {
                kind,
                attributes,
                raw,
            } => match pairs[i] {
                Some(close) if close < hi => {
                    sink.enter(*kind, attributes);
                    walk_range(tokens, pairs, i + 1, close, depth + 1, sink);
                    sink.exit();
                    i = close;
                }
                _ => {
                    tracing::warn!(tag = %raw, "Unclosed tag kept as text");
                    sink.text(raw);
                }
            },
            Token::CloseTag { raw, .. } => {
                tracing::warn!(tag = %raw, "Unopened close tag kept as text");
                sink.text(raw);
            }
        }
        i += 1;
    }
}

fn flush_as_text<S: TokenSink>(tokens: &[Token], sink: &mut S) {
    for token in tokens {
        match token {
            Token::Text(text) => {
                sink.text(&html_escape::decode_html_entities(text))
            }
            Token::Atomic { embed, .. } => sink.atomic(embed),
            Token::OpenTag { .. } | Token::CloseTag { .. } => {}
        }
    }
}
