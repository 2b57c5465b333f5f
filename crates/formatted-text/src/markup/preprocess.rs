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

//! Normalisation applied to raw editor markup before tokenizing.
//!
//! A contenteditable surface expresses line structure with `<div>` and
//! `<br>` elements; these collapse to `\n`. Block-level markdown (fenced
//! code, `>` quote lines) is rewritten to tags here so the tokenizer only
//! deals with inline delimiters.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::ParseOptions;

static EMPTY_DIV_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div><br[^>]*></div>").unwrap());
static DIV_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</div>\s*<div>").unwrap());
static DIV_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div[^>]*>").unwrap());
static DIV_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</div>").unwrap());
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br[^>]*>").unwrap());
static FENCED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:([A-Za-z0-9_+\-#.]+)\n)?([\s\S]*?)```").unwrap()
});
static QUOTE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:&gt;|>)[ \t]?(.*)$").unwrap());
static PRE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)pre\b[^>]*>").unwrap());
static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

/// Rewrite editor markup into the form the tokenizer consumes.
pub(crate) fn preprocess(html: &str, options: &ParseOptions) -> String {
    let mut text = EMPTY_DIV_LINE.replace_all(html, "<div></div>").into_owned();
    text = LINE_BREAK.replace_all(&text, "\n").into_owned();
    text = DIV_BOUNDARY.replace_all(&text, "\n").into_owned();
    text = DIV_OPEN.replace_all(&text, "\n").into_owned();
    text = DIV_CLOSE.replace_all(&text, "").into_owned();
    text = text.replace("&nbsp;", " ").replace('\u{200b}', "");

    if !options.skip_markdown {
        text = FENCED_CODE
            .replace_all(&text, |caps: &Captures| {
                let language = caps.get(1).map_or("", |m| m.as_str());
                let code = &caps[2];
                let code = code.strip_prefix('\n').unwrap_or(code);
                let code = code.strip_suffix('\n').unwrap_or(code);
                if language.is_empty() {
                    format!("<pre>{code}</pre>")
                } else {
                    format!(
                        "<pre data-language=\"{}\">{code}</pre>",
                        html_escape::encode_double_quoted_attribute(language)
                    )
                }
            })
            .into_owned();
        text = wrap_quote_lines(&text);
    }

    if options.with_markdown_links {
        text = MARKDOWN_LINK
            .replace_all(&text, |caps: &Captures| {
                format!(
                    "<a href=\"{}\">{}</a>",
                    html_escape::encode_double_quoted_attribute(&caps[2]),
                    &caps[1]
                )
            })
            .into_owned();
    }

    text.trim().to_owned()
}

/// Wrap each run of consecutive `>` lines in one blockquote, so inline
/// markup spanning those lines stays balanced. Lines inside `<pre>` are
/// code and are left alone.
fn wrap_quote_lines(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut quoted: Vec<&str> = Vec::new();
    let mut pre_depth = 0usize;
    for line in text.split('\n') {
        let content = (pre_depth == 0)
            .then(|| QUOTE_LINE.captures(line))
            .flatten()
            .and_then(|caps| caps.get(1));
        match content {
            Some(content) => quoted.push(content.as_str()),
            None => {
                flush_quote(&mut lines, &mut quoted);
                lines.push(line.to_owned());
            }
        }
        for caps in PRE_TAG.captures_iter(line) {
            if caps[1].is_empty() {
                pre_depth += 1;
            } else {
                pre_depth = pre_depth.saturating_sub(1);
            }
        }
    }
    flush_quote(&mut lines, &mut quoted);
    lines.join("\n")
}

fn flush_quote(lines: &mut Vec<String>, quoted: &mut Vec<&str>) {
    if !quoted.is_empty() {
        lines.push(format!("<blockquote>{}</blockquote>", quoted.join("\n")));
        quoted.clear();
    }
}
