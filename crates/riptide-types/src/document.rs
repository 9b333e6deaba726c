//! The public output type: `Document` plus the scrape/crawl response
//! envelopes (spec.md §3 "Document", invariants I1-I4).

use crate::engine::ProxyUsed;
use crate::gatekeeper::GatekeeperEvidence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_url: String,
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub proxy_used: Option<ProxyUsed>,
    pub num_pages: Option<u32>,
    pub title: Option<String>,
    pub gatekeeper: Option<GatekeeperEvidence>,
}

/// The public scrape output (spec.md §3 "Document"). Any subset of the
/// optional fields is populated depending on the requested formats (I1, I3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub markdown: Option<String>,
    pub raw_html: Option<String>,
    pub html: Option<String>,
    pub links: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub metadata: DocumentMetadata,
}

/// A public `{code, message}` error tuple (spec.md §7 "Propagation").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicError {
    pub code: String,
    pub message: String,
}

/// The top-level scrape response: exactly one of success/failure (I1).
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    Success(Box<Document>),
    Failure(PublicError),
}

impl Serialize for ScrapeOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        match self {
            ScrapeOutcome::Success(document) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("document", document)?;
            }
            ScrapeOutcome::Failure(error) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStats {
    pub discovered: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub limit: usize,
}

impl CrawlStats {
    /// I4: `succeeded + failed == processed` and `processed <= min(limit, discovered)`.
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.processed
            && self.processed <= self.limit.min(self.discovered)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPageError {
    pub url: String,
    pub error: PublicError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub success: bool,
    pub pages: Vec<Document>,
    pub errors: Vec<CrawlPageError>,
    pub stats: CrawlStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_outcome_success_serializes_with_document_not_error() {
        let outcome = ScrapeOutcome::Success(Box::new(Document::default()));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("document").is_some());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn scrape_outcome_failure_serializes_with_error_not_document() {
        let outcome = ScrapeOutcome::Failure(PublicError {
            code: "INTERNAL_ERROR".into(),
            message: "boom".into(),
        });
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("error").is_some());
        assert!(value.get("document").is_none());
    }

    #[test]
    fn crawl_stats_consistency_invariant() {
        let stats = CrawlStats {
            discovered: 10,
            processed: 5,
            succeeded: 4,
            failed: 1,
            limit: 5,
        };
        assert!(stats.is_consistent());

        let bad = CrawlStats {
            discovered: 10,
            processed: 5,
            succeeded: 4,
            failed: 2,
            limit: 5,
        };
        assert!(!bad.is_consistent());
    }
}
