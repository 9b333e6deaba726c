//! Request option types: the immutable, per-request configuration that
//! flows through the whole scrape/crawl pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Markdown,
    Html,
    RawHtml,
    Links,
    Images,
}

/// PDF-specific parsing behavior.
///
/// `parsers: ["pdf"]` in the wire format maps to `Parse { max_pages: None }`;
/// omitting `parsers` entirely maps to `PassThrough`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PdfParsing {
    /// Download the bytes but do not extract text; html/markdown carry the
    /// base64 body so downstream logic still sees non-empty content.
    PassThrough,
    /// Extract page count, title and text, bounded by `max_pages`.
    Parse { max_pages: Option<u32> },
}

impl Default for PdfParsing {
    fn default() -> Self {
        PdfParsing::PassThrough
    }
}

/// Per-request scrape options (spec.md §3 "Scrape options").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeOptions {
    pub formats: HashSet<Format>,
    pub only_main_content: bool,
    pub headers: HashMap<String, String>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    /// Milliseconds; bounds the total scrape.
    pub timeout_ms: Option<u64>,
    /// Milliseconds the browser engine idles after load.
    pub wait_for_ms: Option<u64>,
    pub parsers: Option<PdfParsing>,
    /// `None` means "compute the policy default" (see [`ScrapeOptions::effective_skip_tls_verification`]).
    pub skip_tls_verification: Option<bool>,
    pub remove_base64_images: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            formats: HashSet::from([Format::Markdown]),
            only_main_content: true,
            headers: HashMap::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            timeout_ms: None,
            wait_for_ms: None,
            parsers: None,
            skip_tls_verification: None,
            remove_base64_images: true,
        }
    }
}

impl ScrapeOptions {
    /// Resolves the `skipTlsVerification` open question (spec.md §9): when the
    /// caller did not set it explicitly, default to `true` unless custom
    /// headers were supplied, on the theory that authenticated calls imply a
    /// caller who already hardened TLS on their side. This is the documented
    /// policy from the source system, not a universally safe default — a
    /// deployment that wants strict TLS by default should set the field
    /// explicitly on every request.
    pub fn effective_skip_tls_verification(&self) -> bool {
        self.skip_tls_verification
            .unwrap_or_else(|| self.headers.is_empty())
    }

    pub fn wants(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }

    pub fn wants_markdown_derived_html(&self) -> bool {
        self.wants(Format::Markdown) || self.wants(Format::Html)
    }
}

/// Per-request crawl options (spec.md §3 "Crawl options").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlOptions {
    pub limit: usize,
    pub max_depth: usize,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub allow_backward_crawling: bool,
    pub allow_external_content_links: bool,
    pub allow_subdomains: bool,
    pub regex_on_full_url: bool,
    pub headers: HashMap<String, String>,
    pub scrape_options: ScrapeOptions,
}

pub const MAX_CRAWL_LIMIT: usize = 10_000;
pub const MAX_CRAWL_DEPTH: usize = 20;

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            limit: 100,
            max_depth: 2,
            includes: Vec::new(),
            excludes: Vec::new(),
            allow_backward_crawling: false,
            allow_external_content_links: false,
            allow_subdomains: false,
            regex_on_full_url: false,
            headers: HashMap::new(),
            scrape_options: ScrapeOptions::default(),
        }
    }
}

impl CrawlOptions {
    /// Clamp `limit`/`max_depth` to the documented caps (spec.md §3).
    pub fn clamped(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_CRAWL_LIMIT);
        self.max_depth = self.max_depth.min(MAX_CRAWL_DEPTH);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skip_tls_is_true_without_headers() {
        let opts = ScrapeOptions::default();
        assert!(opts.effective_skip_tls_verification());
    }

    #[test]
    fn custom_headers_flip_default_skip_tls_to_false() {
        let mut opts = ScrapeOptions::default();
        opts.headers.insert("Authorization".into(), "Bearer x".into());
        assert!(!opts.effective_skip_tls_verification());
    }

    #[test]
    fn explicit_skip_tls_wins_over_headers() {
        let mut opts = ScrapeOptions::default();
        opts.headers.insert("Authorization".into(), "Bearer x".into());
        opts.skip_tls_verification = Some(true);
        assert!(opts.effective_skip_tls_verification());
    }

    #[test]
    fn crawl_options_clamp_limit_and_depth() {
        let opts = CrawlOptions {
            limit: 999_999,
            max_depth: 999,
            ..Default::default()
        }
        .clamped();
        assert_eq!(opts.limit, MAX_CRAWL_LIMIT);
        assert_eq!(opts.max_depth, MAX_CRAWL_DEPTH);
    }
}
