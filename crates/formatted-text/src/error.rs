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

use thiserror::Error;

use crate::format::FormatKind;

/// Why a format request was dropped. The markup is never changed when one
/// of these is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("markup has no characters to format")]
    EmptyMarkup,

    #[error("selection is collapsed")]
    EmptySelection,

    #[error("selection {start}..={end} is inverted")]
    InvertedSelection { start: usize, end: usize },

    #[error("selection {start}..={end} is outside the {len} characters of the markup")]
    SelectionOutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("{0} cannot be combined with the formats already selected")]
    FormatDisabled(FormatKind),

    #[error("a link needs a non-empty, valid URL")]
    MissingLinkUrl,
}
