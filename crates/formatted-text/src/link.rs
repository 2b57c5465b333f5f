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

use email_address::EmailAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.\-]*://|mailto:|tel:)").unwrap()
});

/// Turn what a user typed into the link prompt into a URL.
///
/// Bare email addresses become `mailto:` links and scheme-less input gets
/// `http://`. Returns `None` for empty or unparseable input.
pub fn normalize_link_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if EmailAddress::is_valid(trimmed) {
        format!("mailto:{trimmed}")
    } else if SCHEME.is_match(trimmed) {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };
    match Url::parse(&candidate) {
        Ok(url) => Some(url.into()),
        Err(error) => {
            tracing::debug!(%error, input = trimmed, "Rejected link URL");
            None
        }
    }
}
