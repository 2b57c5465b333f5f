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

//! Markup from the per-character model.
//!
//! Scanning left to right, each formatted position opens the format with
//! the longest unbroken run from that position (the earliest added format
//! wins a tie), writes the run with that format removed, and continues
//! after the run. Regenerating markup that was itself regenerated gives
//! the same markup back.

use super::char_cell::{ActiveFormat, CharCell};
use crate::markup::render::{
    write_close_tag, write_embed, write_open_tag, write_text,
};
use crate::markup::MAX_RECURSION_DEPTH;

pub fn regenerate(cells: &[CharCell]) -> String {
    let mut cells = cells.to_vec();
    let mut out = String::new();
    write_cells(&mut out, &mut cells, 0);
    out
}

fn write_cells(out: &mut String, cells: &mut [CharCell], depth: usize) {
    let mut plain = String::new();
    let mut i = 0;
    while i < cells.len() {
        if let Some(embed) = &cells[i].media {
            write_text(out, &std::mem::take(&mut plain));
            write_embed(out, embed);
            i += 1;
            continue;
        }

        let longest = if depth < MAX_RECURSION_DEPTH {
            longest_run(cells, i)
        } else {
            None
        };
        let Some((format, len)) = longest else {
            plain.push(cells[i].ch);
            i += 1;
            continue;
        };

        write_text(out, &std::mem::take(&mut plain));
        let run = &mut cells[i..i + len];
        for cell in run.iter_mut() {
            cell.formats.remove(format.kind);
        }
        write_open_tag(out, format.kind, &format.attributes);
        write_cells(out, run, depth + 1);
        write_close_tag(out, format.kind);
        i += len;
    }
    write_text(out, &plain);
}

/// The format of `cells[at]` with the longest run starting at `at`.
fn longest_run(cells: &[CharCell], at: usize) -> Option<(ActiveFormat, usize)> {
    let mut best: Option<(&ActiveFormat, usize)> = None;
    for format in cells[at].formats.iter() {
        let len = cells[at..]
            .iter()
            .take_while(|cell| cell.formats.contains(format))
            .count();
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((format, len));
        }
    }
    best.map(|(format, len)| (format.clone(), len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::char_cell::char_cells;

    fn regen(markup: &str) -> String {
        regenerate(&char_cells(markup))
    }

    #[test]
    fn plain_text_is_escaped_and_breaks_restored() {
        assert_eq!(regen("a &amp; b<br>c"), "a &amp; b<br>c");
    }

    #[test]
    fn longest_run_becomes_the_outer_tag() {
        assert_eq!(regen("<i><b>a</b></i><b>bc</b>"), "<b><i>a</i>bc</b>");
        assert_eq!(regen("<i><b>a</b>b</i><b>c</b>"), "<i><b>a</b>b</i><b>c</b>");
        assert_eq!(regen("<b>a</b><b>b</b>"), "<b>ab</b>");
    }

    #[test]
    fn ties_go_to_the_earliest_format() {
        assert_eq!(regen("<i><b>ab</b></i>"), "<i><b>ab</b></i>");
        assert_eq!(regen("<b><i>ab</i></b>"), "<b><i>ab</i></b>");
    }

    #[test]
    fn links_with_different_urls_stay_apart() {
        let markup = concat!(
            r#"<a class="text-entity-link" dir="auto" href="https://a">a</a>"#,
            r#"<a class="text-entity-link" dir="auto" href="https://b">b</a>"#,
        );
        assert_eq!(regen(markup), markup);
    }

    #[test]
    fn embeds_break_runs() {
        let html = regen(r#"<b>a<img alt="x" data-document-id="1">b</b>"#);
        assert!(html.starts_with("<b>a</b><img "));
        assert!(html.ends_with("><b>b</b>"));
    }

    #[test]
    fn regenerated_markup_is_stable() {
        let first = regen("<u>ab<s>cd</s></u><s>e</s>");
        assert_eq!(regen(&first), first);
    }
}
