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

//! Conversion from composer markup to [`FormattedText`].

pub mod flatten;
pub(crate) mod preprocess;
pub mod render;
pub(crate) mod tag_table;
pub mod tokenizer;
pub mod tree;
pub(crate) mod walker;

use crate::entity::FormattedText;

pub use flatten::flatten;
pub use tokenizer::{tokenize, EmbedAttributes, Token, Tokenizer};
pub use tree::{Annotation, AnnotationHandle, AnnotationTree};

/// Bound on nesting depth for every recursive walk over markup or trees.
pub const MAX_RECURSION_DEPTH: usize = 50;

/// Stands in for an embed with no alt text.
pub(crate) const OBJECT_REPLACEMENT: &str = "\u{FFFC}";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Turn `[text](url)` into links.
    pub with_markdown_links: bool,
    /// Treat markdown delimiters, fences and quote lines as plain text.
    pub skip_markdown: bool,
}

impl ParseOptions {
    pub fn with_markdown_links(mut self, enabled: bool) -> Self {
        self.with_markdown_links = enabled;
        self
    }

    pub fn skip_markdown(mut self, skip: bool) -> Self {
        self.skip_markdown = skip;
        self
    }
}

/// Parse composer markup into plain text and a pre-ordered entity list.
///
/// Never fails: malformed markup degrades to literal text.
pub fn parse_html_as_formatted_text(
    html: &str,
    options: &ParseOptions,
) -> FormattedText {
    let tree = AnnotationTree::parse(html, options);
    flatten(&tree)
}

/// Tokens for markup as it sits in the editing surface: no markdown and no
/// trimming, so every character the user sees is accounted for.
pub(crate) fn tokenize_editor_markup(markup: &str) -> Vec<Token> {
    Tokenizer::new(&ParseOptions::default().skip_markdown(true))
        .trim_edges(false)
        .tokenize(markup)
}
