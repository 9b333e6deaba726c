//! Shared data model for the RipTide scrape/crawl core.
//!
//! This crate has no behavior of its own: it defines the options, results,
//! error taxonomy and the per-request `Meta` record that every other crate
//! in the workspace builds on, so that engines, the gatekeeper, the
//! transformers and the orchestrator can all exchange values without
//! depending on each other.

pub mod document;
pub mod engine;
pub mod error;
pub mod feature;
pub mod gatekeeper;
pub mod meta;
pub mod options;

pub use document::{
    CrawlOutcome, CrawlPageError, CrawlStats, Document, DocumentMetadata, PublicError,
    ScrapeOutcome,
};
pub use engine::{EngineOutcome, EngineResult, PdfMeta, ProxyUsed, RenderStatus};
pub use error::{CancellationKind, EngineDomainError, ScrapeError, TransportError};
pub use feature::{FeatureFlag, FeatureSet};
pub use gatekeeper::{BlockClass, ContentStatus, EvidenceEntry, GatekeeperEvidence, QualityRecord, Thresholds};
pub use meta::{CancellationSignal, Meta, NeverCancelled};
pub use options::{CrawlOptions, Format, PdfParsing, ScrapeOptions, MAX_CRAWL_DEPTH, MAX_CRAWL_LIMIT};
