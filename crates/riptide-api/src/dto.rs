//! Wire-level request/response shapes for the three HTTP endpoints
//! (spec.md §6 "External interfaces").

use riptide_types::{CrawlOptions, ScrapeOptions};
use serde::{Deserialize, Serialize};

/// `POST /scrape` body: a url plus the flattened [`ScrapeOptions`] fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: ScrapeOptions,
}

/// `POST /crawl` body: a url plus the flattened [`CrawlOptions`] fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: CrawlOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_request_deserializes_url_alongside_flattened_options() {
        let body = serde_json::json!({
            "url": "https://example.com",
            "only_main_content": false,
        });
        let request: ScrapeRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.url, "https://example.com");
        assert!(!request.options.only_main_content);
    }

    #[test]
    fn scrape_request_defaults_options_when_absent() {
        let body = serde_json::json!({ "url": "https://example.com" });
        let request: ScrapeRequest = serde_json::from_value(body).unwrap();
        assert!(request.options.only_main_content);
    }

    #[test]
    fn crawl_request_deserializes_nested_scrape_options() {
        let body = serde_json::json!({
            "url": "https://example.com",
            "limit": 10,
            "scrape_options": { "formats": ["markdown", "links"] },
        });
        let request: CrawlRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.options.limit, 10);
    }
}
