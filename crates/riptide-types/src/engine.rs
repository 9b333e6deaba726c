//! Engine result type and the tagged-result control flow that replaces the
//! source system's thrown `AddFeatureError` (spec.md §9 Design Notes).

use crate::feature::FeatureSet;
use crate::gatekeeper::GatekeeperEvidence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyUsed {
    Basic,
    Stealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Loaded,
    Timeout,
    NavError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfMeta {
    pub pages: u32,
    pub title: Option<String>,
}

/// The outcome of one successful engine attempt, before gatekeeper
/// evaluation and transformation (spec.md §3 "EngineResult").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResult {
    pub final_url: String,
    /// HTML body, or the base64 body for pass-through PDF/document engines.
    pub html: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub proxy_used: Option<ProxyUsed>,
    pub pdf_meta: Option<PdfMeta>,
    pub render_status: Option<RenderStatus>,
    /// Evidence the engine itself produced (the browser microservice may
    /// supply its own); merged into the final document metadata.
    pub gatekeeper_evidence: Option<GatekeeperEvidence>,
}

impl EngineResult {
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status) || self.status == 304
    }
}

/// What an engine attempt returns to the orchestrator, replacing the
/// source's thrown-exception control flow with an explicit tagged result.
#[derive(Debug)]
pub enum EngineOutcome {
    Ok(EngineResult),
    /// The specialty sniffer detected a content type requiring a feature
    /// escalation; the orchestrator should add these flags and restart the
    /// fallback list (spec.md §4.5, §4.7 step 1).
    Escalate(FeatureSet),
    /// A transport-layer failure (SSL, DNS, insecure connection, proxy
    /// selection); advances to the next engine (spec.md §7 "Transport").
    Transport(crate::error::TransportError),
    /// An engine-domain failure that still allows fallback to continue
    /// (spec.md §7 "Engine-domain").
    Domain(crate::error::EngineDomainError),
    /// The engine ran but produced insufficient content; advances to the
    /// next engine (spec.md §4.7 step 4).
    Unsuccessful(String),
    /// A cancellation-class failure; terminal, no further fallback
    /// (spec.md §5 "Cancellation semantics").
    Cancelled(crate::error::CancellationKind),
}
