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

//! Endpoint resolution: enumerate the currently reachable endpoints for a
//! scheme by running its listing command and parsing the output.
//!
//! Resolution failures are recoverable; callers building completion lists
//! should treat them as "zero endpoints", not abort.

pub mod cache;
pub mod parser;

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::method::descriptor::MethodDescriptor;
use cache::ResolutionCache;
pub use cache::DEFAULT_TTL;
pub use parser::parse_listing;

/// Resolves endpoint lists, with an optional per-scheme TTL cache for
/// methods that allow it.
#[derive(Debug)]
pub struct EndpointResolver {
    cache: ResolutionCache,
}

impl Default for EndpointResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl EndpointResolver {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache: ResolutionCache::new(cache_ttl),
        }
    }

    /// Resolve the reachable endpoint identifiers for a method.
    ///
    /// Serves from the cache only when the descriptor allows it; the list
    /// is otherwise always derived from a live subprocess call and never
    /// persisted.
    pub async fn resolve(
        &self,
        descriptor: &MethodDescriptor,
    ) -> Result<Vec<String>, ResolveError> {
        let listing = descriptor
            .listing
            .as_ref()
            .ok_or_else(|| ResolveError::NotSupported {
                method: descriptor.name.clone(),
            })?;

        if descriptor.completion_cache_allowed {
            if let Some(identifiers) = self.cache.get(&descriptor.name) {
                debug!(
                    scheme = %descriptor.name,
                    count = identifiers.len(),
                    "serving endpoint list from cache"
                );
                return Ok(identifiers);
            }
        }

        debug!(
            scheme = %descriptor.name,
            program = %listing.program,
            "running endpoint listing"
        );
        let output = Command::new(&listing.program)
            .args(&listing.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ResolveError::Spawn {
                program: listing.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                scheme = %descriptor.name,
                status = %output.status,
                "endpoint listing failed"
            );
            return Err(ResolveError::CommandFailed {
                program: listing.program.clone(),
                status: output.status,
                stderr: stderr.trim().lines().next().unwrap_or("").to_string(),
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let identifiers = parser::parse_listing(&raw, listing);

        // An empty fleet is a normal state; a format mismatch is not.
        if identifiers.is_empty() && parser::has_data_lines(&raw, listing) {
            return Err(ResolveError::Unparseable {
                program: listing.program.clone(),
            });
        }

        debug!(
            scheme = %descriptor.name,
            count = identifiers.len(),
            "resolved endpoints"
        );
        if descriptor.completion_cache_allowed {
            self.cache.put(&descriptor.name, identifiers.clone());
        }
        Ok(identifiers)
    }
}
