//! The per-scrape working record (spec.md §3 "Meta", "Lifecycle").

use crate::error::CancellationKind;
use crate::feature::FeatureSet;
use crate::options::ScrapeOptions;
use std::sync::Arc;
use tracing::Span;
use url::Url;
use uuid::Uuid;

/// Anything that can tell the pipeline "stop now, and here is why" —
/// implemented by `riptide-reliability`'s composite abort/timeout manager
/// (C13). Kept as a trait in `riptide-types` so both the manager and its
/// callers (engines, orchestrator) can depend on `riptide-types` without a
/// cycle.
pub trait CancellationSignal: Send + Sync {
    /// `Some(kind)` once cancelled; the tier that fired first.
    fn cancelled(&self) -> Option<CancellationKind>;
}

/// A signal that never fires; used in tests and anywhere cancellation is
/// not wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancelled;

impl CancellationSignal for NeverCancelled {
    fn cancelled(&self) -> Option<CancellationKind> {
        None
    }
}

/// The per-scrape working record: created at request entry, threaded through
/// every engine attempt, and disposed when the pipeline returns.
#[derive(Clone)]
pub struct Meta {
    pub request_id: Uuid,
    pub original_url: Url,
    pub canonical_url: Url,
    pub options: Arc<ScrapeOptions>,
    pub feature_flags: FeatureSet,
    pub span: Span,
    pub cancellation: Arc<dyn CancellationSignal>,
}

impl Meta {
    pub fn new(original_url: Url, options: ScrapeOptions, cancellation: Arc<dyn CancellationSignal>) -> Self {
        let canonical_url = canonicalize(&original_url);
        let feature_flags = crate::feature::detect_from_url(&canonical_url);
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("scrape", request_id = %request_id, url = %canonical_url);
        Self {
            request_id,
            original_url,
            canonical_url,
            options: Arc::new(options),
            feature_flags,
            span,
            cancellation,
        }
    }

    pub fn add_feature_flags(&mut self, flags: FeatureSet) {
        self.feature_flags.extend(flags);
    }

    pub fn check_cancelled(&self) -> Result<(), CancellationKind> {
        match self.cancellation.cancelled() {
            Some(kind) => Err(kind),
            None => Ok(()),
        }
    }
}

/// Normalizes a URL the way the pipeline compares/deduplicates it: lowercase
/// scheme+host, no fragment. Query strings are preserved (crawl filtering
/// decides separately whether to strip them; see spec.md §4.11).
fn canonicalize(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_fragment() {
        let url = Url::parse("https://example.com/a#section").unwrap();
        let meta = Meta::new(url, ScrapeOptions::default(), Arc::new(NeverCancelled));
        assert_eq!(meta.canonical_url.fragment(), None);
    }

    #[test]
    fn pdf_url_seeds_pdf_feature_flag() {
        let url = Url::parse("https://example.com/paper.pdf").unwrap();
        let meta = Meta::new(url, ScrapeOptions::default(), Arc::new(NeverCancelled));
        assert!(meta
            .feature_flags
            .contains(&crate::feature::FeatureFlag::Pdf));
    }
}
