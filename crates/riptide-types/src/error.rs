//! Error taxonomy (spec.md §7): kinds, not names. Each variant here is the
//! concrete Rust type behind one of the taxonomy's bullets; `riptide-api`'s
//! `ApiError` maps these onto the public `{code, message}` HTTP contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which cancellation tier fired first, so errors surface with the
/// originating cause (spec.md §4.12, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationKind {
    ScrapeTimeout,
    ExternalAbort,
}

/// Transport-layer failures from the Secure Dispatcher (spec.md §4.1, §7).
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("TLS error: {0}")]
    Ssl(String),
    #[error("insecure connection blocked: {0}")]
    InsecureConnection(String),
    #[error("DNS resolution failed: {0}")]
    Dns(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("proxy selection failed: {0}")]
    ProxySelection(String),
}

/// Engine-domain failures that still allow fallback to continue
/// (spec.md §4.7 step 2, §7 "Engine-domain").
#[derive(Debug, Error, Clone)]
pub enum EngineDomainError {
    #[error("PDF engine detected an antibot response")]
    PdfAntibot,
    #[error("document engine detected an antibot response")]
    DocumentAntibot,
    #[error("insufficient time remaining to parse PDF: {0}")]
    PdfInsufficientTime(String),
    #[error("engine produced insufficient content: {0}")]
    EngineUnsuccessful(String),
}

/// The terminal error returned by the fallback orchestrator when every
/// engine has been exhausted, or a cancellation/validation/internal error
/// occurred (spec.md §4.7 "If all rounds exhaust", §7).
#[derive(Debug, Error, Clone)]
pub enum ScrapeError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Domain(#[from] EngineDomainError),
    #[error("scrape cancelled: {0:?}")]
    Cancelled(CancellationKind),
    #[error("no engines left for this URL")]
    NoEnginesLeft,
    #[error("robots.txt or blocklist denied this URL: {0}")]
    CrawlDenied(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScrapeError {
    /// Stable public error code (spec.md §7 "a stable public {code, message} tuple").
    pub fn code(&self) -> &'static str {
        match self {
            ScrapeError::Validation(_) => "VALIDATION_ERROR",
            ScrapeError::Transport(TransportError::Ssl(_)) => "SSL_ERROR",
            ScrapeError::Transport(TransportError::InsecureConnection(_)) => {
                "INSECURE_CONNECTION"
            }
            ScrapeError::Transport(TransportError::Dns(_)) => "DNS_ERROR",
            ScrapeError::Transport(TransportError::Network(_)) => "NETWORK_ERROR",
            ScrapeError::Transport(TransportError::ProxySelection(_)) => "PROXY_SELECTION_ERROR",
            ScrapeError::Domain(EngineDomainError::PdfAntibot) => "PDF_ANTIBOT",
            ScrapeError::Domain(EngineDomainError::DocumentAntibot) => "DOCUMENT_ANTIBOT",
            ScrapeError::Domain(EngineDomainError::PdfInsufficientTime(_)) => {
                "PDF_INSUFFICIENT_TIME"
            }
            ScrapeError::Domain(EngineDomainError::EngineUnsuccessful(_)) => "ENGINE_UNSUCCESSFUL",
            ScrapeError::Cancelled(CancellationKind::ScrapeTimeout) => "SCRAPE_TIMEOUT",
            ScrapeError::Cancelled(CancellationKind::ExternalAbort) => "ABORTED",
            ScrapeError::NoEnginesLeft => "NO_ENGINES_LEFT",
            ScrapeError::CrawlDenied(_) => "CRAWL_DENIED",
            ScrapeError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
