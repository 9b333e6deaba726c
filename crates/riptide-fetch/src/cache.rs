//! Conditional-GET cache for the Fetch engine (spec.md §4.2, C2).
//!
//! Keyed by URL, stores the validators the origin gave us on the last
//! `200` response so the next request can ask "has this changed" instead
//! of re-downloading the body. The same per-host `DashMap` caching
//! pattern backs the robots.txt evaluator's cache.

use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct CachedValidators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    /// The body and status stored from the last full (non-304) fetch, so a
    /// `304 Not Modified` response can be turned back into a complete
    /// result without a second round trip.
    pub body: Vec<u8>,
    pub status: u16,
    pub content_type: Option<String>,
    pub final_url: String,
}

#[derive(Default)]
pub struct ConditionalGetCache {
    entries: DashMap<String, CachedValidators>,
}

impl ConditionalGetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<CachedValidators> {
        self.entries.get(url).map(|entry| entry.clone())
    }

    pub fn store(&self, url: String, validators: CachedValidators) {
        self.entries.insert(url, validators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_retrieves_validators() {
        let cache = ConditionalGetCache::new();
        assert!(cache.get("https://example.com").is_none());

        cache.store(
            "https://example.com".to_string(),
            CachedValidators {
                etag: Some("\"abc\"".to_string()),
                last_modified: None,
                body: b"hello".to_vec(),
                status: 200,
                content_type: Some("text/html".to_string()),
                final_url: "https://example.com".to_string(),
            },
        );

        let cached = cache.get("https://example.com").unwrap();
        assert_eq!(cached.etag.as_deref(), Some("\"abc\""));
        assert_eq!(cached.body, b"hello");
    }
}
