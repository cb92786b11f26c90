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

//! Input validation for the pieces of an address that end up in a login
//! program's argv.
//!
//! Every host and user name passes through here before any argv is built,
//! so no shell-significant bytes reach a spawned login program or a
//! command line replayed inside an existing hop's shell.

use thiserror::Error;

/// A field that failed validation, with the reason.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a hostname, jail name, or container task identifier.
///
/// Accepts alphanumerics, dots, hyphens, underscores, slashes and colons
/// (ECS task ARNs contain both), plus bracketed IPv6 literals. Rejects
/// anything a shell could interpret.
pub fn sanitize_hostname(hostname: &str) -> Result<(), ValidationError> {
    if hostname.trim().is_empty() {
        return Err(ValidationError::new("hostname", "cannot be empty"));
    }

    const MAX_HOSTNAME_LENGTH: usize = 253;
    if hostname.len() > MAX_HOSTNAME_LENGTH {
        return Err(ValidationError::new(
            "hostname",
            format!("exceeds maximum length of {MAX_HOSTNAME_LENGTH}"),
        ));
    }

    let is_ipv6 = hostname.starts_with('[') && hostname.ends_with(']');
    if is_ipv6 {
        let ipv6_addr = &hostname[1..hostname.len() - 1];
        if ipv6_addr.is_empty() || !ipv6_addr.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
            return Err(ValidationError::new("hostname", "invalid IPv6 literal"));
        }
        return Ok(());
    }

    let valid_chars =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/' | ':');
    if !hostname.chars().all(valid_chars) {
        return Err(ValidationError::new(
            "hostname",
            "contains invalid characters",
        ));
    }

    if hostname.contains("..") {
        return Err(ValidationError::new("hostname", "contains double dots"));
    }

    Ok(())
}

/// Validate a username (also used for ECS cluster names, which ride the
/// user slot of an address).
pub fn sanitize_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::new("username", "cannot be empty"));
    }

    const MAX_USERNAME_LENGTH: usize = 64;
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::new(
            "username",
            format!("exceeds maximum length of {MAX_USERNAME_LENGTH}"),
        ));
    }

    let valid_chars = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if !username.chars().all(valid_chars) {
        return Err(ValidationError::new(
            "username",
            "contains invalid characters",
        ));
    }

    Ok(())
}
