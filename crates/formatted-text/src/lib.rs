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

pub mod dom;
mod entity;
mod error;
pub mod format;
pub mod history;
mod link;
pub mod markup;

pub use crate::dom::offset_mapper::{range_for_offsets, selection_offsets};
pub use crate::dom::{
    to_absolute_offset, to_dom_position, DomHandle, DomNode, DomPosition,
    DomRange, Edge, EditableDom,
};
pub use crate::entity::{
    Attributes, Entity, EntityKind, FormattedText, Utf16FormattedText,
};
pub use crate::error::FormatError;
pub use crate::format::{
    apply_format, char_cells, regenerate, ActiveFormat, ButtonState,
    CharCell, FormatKind, FormatOutcome, FormatPolicy, FormatSet,
    TextFormatter,
};
pub use crate::history::{
    HistoryConfig, HistoryStep, HtmlHistory, HtmlInputSession, SessionState,
};
pub use crate::link::normalize_link_url;
pub use crate::markup::{
    parse_html_as_formatted_text, AnnotationTree, ParseOptions,
    MAX_RECURSION_DEPTH,
};
