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

use std::time::Duration;

use formatted_text::{
    apply_format, parse_html_as_formatted_text, range_for_offsets,
    selection_offsets, to_absolute_offset, to_dom_position, Edge,
    EditableDom, Entity, EntityKind, FormatKind, FormattedText,
    HistoryConfig, HtmlInputSession, ParseOptions, TextFormatter,
};
use indoc::indoc;
use speculoos::prelude::*;
use speculoos::{assert_that, AssertionFailure, Spec};
use web_time::Instant;

fn parse(markup: &str) -> FormattedText {
    parse_html_as_formatted_text(markup, &ParseOptions::default())
}

fn parse_rendered(html: &str) -> FormattedText {
    parse_html_as_formatted_text(html, &ParseOptions::default().skip_markdown(true))
}

trait Roundtrips<T> {
    /// Parsing, rendering and parsing the rendered HTML again yields the
    /// same payload.
    fn roundtrips(&self);
}

impl<'s, T> Roundtrips<T> for Spec<'s, T>
where
    T: AsRef<str>,
{
    fn roundtrips(&self) {
        let first = parse(self.subject.as_ref());
        let rendered = first.to_html();
        let second = parse_rendered(&rendered);
        if first != second {
            AssertionFailure::from_spec(self)
                .with_expected(format!("{first:?}"))
                .with_actual(format!("{second:?} (via {rendered:?})"))
                .fail();
        }
    }
}

#[test]
fn bold_prefix_is_one_entity() {
    assert_that!(parse("<b>hi</b> there")).is_equal_to(FormattedText::new(
        "hi there",
        vec![Entity::new(EntityKind::Bold, 0, 2)],
    ));
}

#[test]
fn unclosed_tag_stays_literal() {
    assert_that!(parse("<b>hi there")).is_equal_to(FormattedText::new(
        "<b>hi there",
        vec![],
    ));
}

#[test]
fn quote_lines_become_one_blockquote() {
    let parsed = parse("> a\n> b");
    assert_that!(parsed.text.as_str()).is_equal_to("a\nb");
    assert_that!(parsed.entities).has_length(1);
    assert_that!(parsed.entities[0].kind).is_equal_to(EntityKind::Blockquote);
    assert_that!((parsed.entities[0].offset, parsed.entities[0].length))
        .is_equal_to((0, 3));
}

#[test]
fn entities_are_in_pre_order() {
    let parsed = parse("<b>a<i>b</i></b><u>c</u>");
    let kinds: Vec<EntityKind> =
        parsed.entities.iter().map(|e| e.kind).collect();
    assert_that!(kinds).is_equal_to(vec![
        EntityKind::Bold,
        EntityKind::Italic,
        EntityKind::Underline,
    ]);
}

#[test]
fn entities_stay_inside_the_text() {
    let parsed = parse(indoc! {r#"
        <b>bold <i>both</i></b> plain ||hidden|| `code`
        <a href="https://matrix.org">link</a>
    "#});
    let len = parsed.text_len();
    for entity in &parsed.entities {
        assert_that!(entity.length).is_greater_than(0);
        assert_that!(entity.offset + entity.length).is_less_than_or_equal_to(len);
    }
}

#[test]
fn well_formed_markup_roundtrips() {
    assert_that!("<b>hi</b> there").roundtrips();
    assert_that!("<b>a<i>b</i>c</b>").roundtrips();
    assert_that!(r#"<a href="https://matrix.org/">link</a> after"#).roundtrips();
    assert_that!("<s>gone</s> and <u>under</u>").roundtrips();
    assert_that!("> a\n> b").roundtrips();
    assert_that!("a < b & c").roundtrips();
    assert_that!(indoc! {r#"
        first line
        <code>inline</code> and <span class="spoiler">secret</span>
    "#})
    .roundtrips();
}

#[test]
fn literal_markdown_delimiters_roundtrip() {
    assert_that!("*<b></b>*x*<b></b>*").roundtrips();
    assert_that!("<code>a**b**</code> and 2 &gt; 1").roundtrips();
    assert_that!("a<br><b></b>&gt; b").roundtrips();

    let parsed = parse("*<b></b>*x*<b></b>*");
    assert_that!(parsed.text.as_str()).is_equal_to("**x**");
    assert_that!(parse_rendered(&parsed.to_html())).is_equal_to(parsed);
}

#[test]
fn custom_emoji_roundtrips() {
    assert_that!(r#"hi <img alt="😀" data-document-id="42"> there"#)
        .roundtrips();
}

#[test]
fn utf16_view_counts_code_units() {
    let parsed = parse("😀 <b>x</b>");
    let utf16 = parsed.to_utf16();
    assert_that!(parsed.entities[0].offset).is_equal_to(2);
    assert_that!(utf16.entities[0].offset).is_equal_to(3);
    assert_that!(utf16.text.len()).is_equal_to(4);
}

#[test]
fn toggling_twice_returns_canonical_markup() {
    for markup in [
        "hello world",
        "<b>hello</b> world",
        "a<i>bc</i>d",
        r#"x<img alt="e" data-document-id="1">y"#,
    ] {
        let dom = EditableDom::parse(markup);
        let canonical = dom.inner_html();
        let last = dom.text_len() - 1;
        let added =
            apply_format(&canonical, 0, last, FormatKind::Underline, false, None)
                .unwrap();
        let removed = apply_format(
            &added.markup,
            0,
            last,
            FormatKind::Underline,
            true,
            None,
        )
        .unwrap();
        assert_that!(removed.markup).is_equal_to(canonical);
    }
}

#[test]
fn formatter_roundtrip_through_selection() {
    let formatter = TextFormatter::default();
    let markup = "one two three";
    let dom = EditableDom::parse(markup);
    let range = range_for_offsets(&dom, 4, 6);

    let bold = formatter.toggle(markup, &range, FormatKind::Bold).unwrap();
    assert_that!(bold.markup.as_str()).is_equal_to("one <b>two</b> three");

    let new_dom = EditableDom::parse(&bold.markup);
    assert_that!(selection_offsets(&new_dom, &bold.selection))
        .is_equal_to(Some((4, 6)));

    let linked = formatter
        .set_link(&bold.markup, &bold.selection, "matrix.org")
        .unwrap();
    let payload = parse(&linked.markup);
    assert_that!(payload.text.as_str()).is_equal_to(markup);
    let link = payload
        .entities
        .iter()
        .find(|e| e.kind == EntityKind::TextLink)
        .unwrap();
    assert_that!(link.url.as_deref()).is_equal_to(Some("http://matrix.org/"));
    assert_that!((link.offset, link.length)).is_equal_to((4, 3));
}

#[test]
fn offsets_and_positions_are_inverse() {
    for markup in [
        "plain",
        "<b>a<i>bc</i></b>d",
        r#"<u>x<img alt="e" data-document-id="1">y</u>z"#,
        "line<br>break",
    ] {
        let dom = EditableDom::parse(markup);
        for offset in 0..=dom.text_len() {
            let position = to_dom_position(&dom, offset);
            assert_that!(to_absolute_offset(&dom, position, Edge::Start))
                .is_equal_to(offset);
        }
    }
}

#[test]
fn history_only_changes_through_the_session() {
    let mut session = HtmlInputSession::new(
        HistoryConfig::default().debounce(Duration::from_millis(300)),
    );
    let t0 = Instant::now();
    session.reset("");
    let mut last_len = session.history().snapshots().len();
    for (i, value) in ["a", "ab", "abc"].iter().enumerate() {
        let now = t0 + Duration::from_secs(i as u64);
        session.set_value(value, now);
        session.poll(now + Duration::from_millis(300));
        let len = session.history().snapshots().len();
        assert_that!(len).is_greater_than_or_equal_to(last_len);
        last_len = len;
    }
    assert_that!(last_len).is_equal_to(4);
}

#[test]
fn history_fork_discards_redo() {
    let mut session = HtmlInputSession::default();
    let t0 = Instant::now();
    session.reset("A");
    session.set_value("B", t0);
    session.flush();
    session.set_value("C", t0);
    session.flush();

    assert_that!(session.undo().value()).is_equal_to(Some("B"));
    session.set_value("D", t0);
    session.flush();

    assert_that!(session.history().snapshots().to_vec())
        .is_equal_to(vec!["A".to_owned(), "B".to_owned(), "D".to_owned()]);
    assert_that!(session.redo().is_last_action()).is_true();
}
