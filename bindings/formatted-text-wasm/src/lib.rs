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

//! WASM bindings for the formatted-text composer model.
//!
//! Payloads cross the boundary as plain JS objects. Entity offsets in
//! parsed payloads count UTF-16 code units, like JS strings do; selection
//! offsets passed to `applyFormat` count characters.

use std::str::FromStr;
use std::time::Duration;

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;
use web_time::Instant;

use formatted_text::{
    Attributes, Entity, FormatKind, HistoryConfig, HistoryStep, ParseOptions,
};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Flatten composer markup into `{ text, entities }` for sending.
#[wasm_bindgen(js_name = parseHtmlAsFormattedText)]
pub fn parse_html_as_formatted_text(
    html: &str,
    with_markdown_links: bool,
    skip_markdown: bool,
) -> Object {
    let options = ParseOptions::default()
        .with_markdown_links(with_markdown_links)
        .skip_markdown(skip_markdown);
    let formatted =
        formatted_text::parse_html_as_formatted_text(html, &options).to_utf16();

    let entities: Array = formatted.entities.iter().map(entity_to_js).collect();
    let object = Object::new();
    set(&object, "text", formatted.text.to_string());
    set(&object, "entities", entities);
    object
}

/// Add or remove a format over the characters `start..=end`.
///
/// `kind` is the snake_case format name, e.g. `"bold"` or `"link"`.
#[wasm_bindgen(js_name = applyFormat)]
pub fn apply_format(
    markup: &str,
    start: u32,
    end: u32,
    kind: &str,
    is_currently_active: bool,
    url: Option<String>,
) -> Result<Object, JsError> {
    let kind = FormatKind::from_str(kind)?;
    let outcome = formatted_text::apply_format(
        markup,
        start as usize,
        end as usize,
        kind,
        is_currently_active,
        url.map(Attributes::Url),
    )?;
    let object = Object::new();
    set(&object, "markup", outcome.markup);
    set(&object, "start", outcome.start as u32);
    set(&object, "end", outcome.end as u32);
    Ok(object)
}

/// Undo history of one input field.
#[wasm_bindgen]
pub struct HtmlInput {
    inner: formatted_text::HtmlInputSession,
}

#[wasm_bindgen]
impl HtmlInput {
    #[wasm_bindgen(constructor)]
    pub fn new(debounce_ms: Option<u32>, max_total_len: Option<u32>) -> Self {
        let mut config = HistoryConfig::default();
        if let Some(ms) = debounce_ms {
            config = config.debounce(Duration::from_millis(u64::from(ms)));
        }
        if let Some(max) = max_total_len {
            config = config.max_total_len(max as usize);
        }
        Self {
            inner: formatted_text::HtmlInputSession::new(config),
        }
    }

    pub fn html(&self) -> String {
        self.inner.html().to_owned()
    }

    pub fn reset(&mut self, initial: &str) {
        self.inner.reset(initial);
    }

    #[wasm_bindgen(js_name = setHtml)]
    pub fn set_html(&mut self, value: &str) {
        self.inner.set_value(value, Instant::now());
    }

    /// Call from a timer; records the last edit once the input is quiet.
    pub fn poll(&mut self) -> bool {
        self.inner.poll(Instant::now())
    }

    pub fn flush(&mut self) -> bool {
        self.inner.flush()
    }

    pub fn undo(&mut self) -> Object {
        step_to_js(self.inner.undo())
    }

    pub fn redo(&mut self) -> Object {
        step_to_js(self.inner.redo())
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.history().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.history().can_redo()
    }

    pub fn teardown(&mut self) {
        self.inner.teardown();
    }
}

fn step_to_js(step: HistoryStep) -> Object {
    let object = Object::new();
    set(&object, "isLastAction", step.is_last_action());
    if let Some(value) = step.value() {
        set(&object, "html", value);
    }
    object
}

fn entity_to_js(entity: &Entity) -> JsValue {
    let object = Object::new();
    set(&object, "type", entity.kind.as_ref());
    set(&object, "offset", entity.offset as u32);
    set(&object, "length", entity.length as u32);
    if let Some(url) = &entity.url {
        set(&object, "url", url.as_str());
    }
    if let Some(language) = &entity.language {
        set(&object, "language", language.as_str());
    }
    if let Some(document_id) = &entity.document_id {
        set(&object, "documentId", document_id.as_str());
    }
    if let Some(user_id) = &entity.user_id {
        set(&object, "userId", user_id.as_str());
    }
    if let Some(can_collapse) = entity.can_collapse {
        set(&object, "canCollapse", can_collapse);
    }
    object.into()
}

fn set(object: &Object, key: &str, value: impl Into<JsValue>) {
    // Setting a data property on a fresh plain object cannot throw.
    let _ = Reflect::set(object, &JsValue::from_str(key), &value.into());
}
