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

//! TTL cache for resolved endpoint lists.
//!
//! Endpoint membership is externally dynamic (jails start and stop,
//! tasks churn), so entries expire on a bounded TTL rather than by
//! explicit invalidation, and nothing is ever persisted to disk.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default lifetime of a cached endpoint list.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct CacheEntry {
    identifiers: Vec<String>,
    cached_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Process-wide endpoint list cache, keyed by scheme name.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// A live entry for the scheme, if one exists and has not expired.
    pub fn get(&self, scheme: &str) -> Option<Vec<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(scheme)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| entry.identifiers.clone())
    }

    /// Store a freshly resolved list for the scheme.
    pub fn put(&self, scheme: &str, identifiers: Vec<String>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            scheme.to_string(),
            CacheEntry {
                identifiers,
                cached_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.put("bastille", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            cache.get("bastille"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_miss_for_unknown_scheme() {
        let cache = ResolutionCache::default();
        assert_eq!(cache.get("jexec"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResolutionCache::new(Duration::ZERO);
        cache.put("bastille", vec!["a".to_string()]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("bastille"), None);
    }

    #[test]
    fn test_put_replaces() {
        let cache = ResolutionCache::default();
        cache.put("ecs", vec!["old".to_string()]);
        cache.put("ecs", vec!["new".to_string()]);
        assert_eq!(cache.get("ecs"), Some(vec!["new".to_string()]));
    }
}
