// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Line-oriented parsing of endpoint listing output.
//!
//! Listing programs print arbitrary whitespace-delimited columns; the
//! only assumption made here is that the identifier sits in one fixed
//! column. Parsing is pure: identical input always yields the identical
//! ordered identifier sequence.

use crate::method::descriptor::ListingSpec;

/// Extract endpoint identifiers from raw listing output.
///
/// Skips the first non-blank line when the format declares a header,
/// splits the rest on whitespace, and takes the field at
/// [`ListingSpec::id_column`]. Blank lines and lines too short to hold
/// the identifier column are dropped. Identifiers equal to a known header
/// token are dropped as well: headers whose column names contain spaces
/// (`jls`'s `IP Address`) split into a different field count than data
/// rows, so positional header skipping alone cannot be trusted.
pub fn parse_listing(raw: &str, spec: &ListingSpec) -> Vec<String> {
    let mut header_pending = spec.skip_header;
    let mut identifiers = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(id) = fields.get(spec.id_column) else {
            continue;
        };
        if spec
            .header_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(id))
        {
            continue;
        }
        identifiers.push((*id).to_string());
    }

    identifiers
}

/// Whether output contained anything that even looked like a data line.
///
/// Used to distinguish "the fleet is empty" (header-only or blank output)
/// from "the format did not match" (data-looking lines, zero identifiers).
pub fn has_data_lines(raw: &str, spec: &ListingSpec) -> bool {
    let non_blank = raw.lines().filter(|l| !l.trim().is_empty()).count();
    let header_lines = usize::from(spec.skip_header);
    non_blank > header_lines
}
