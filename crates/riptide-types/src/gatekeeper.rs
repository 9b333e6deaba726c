//! Gatekeeper evidence types (spec.md §3 "Gatekeeper evidence", §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockClass {
    None,
    Thin,
    Challenge,
    Login,
    SoftBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Usable,
    Thin,
    Challenge,
    Login,
    SoftBlock,
}

impl From<BlockClass> for ContentStatus {
    fn from(block_class: BlockClass) -> Self {
        match block_class {
            BlockClass::None => ContentStatus::Usable,
            BlockClass::Thin => ContentStatus::Thin,
            BlockClass::Challenge => ContentStatus::Challenge,
            BlockClass::Login => ContentStatus::Login,
            BlockClass::SoftBlock => ContentStatus::SoftBlock,
        }
    }
}

/// The quality measurements a gatekeeper rule or threshold is evaluated
/// against (spec.md §4.6 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityRecord {
    pub html_bytes: usize,
    pub visible_text_chars: usize,
    pub main_content_chars: usize,
    pub has_structured_data: bool,
}

/// The thresholds applied when no rule fires (spec.md §4.6 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_html_bytes: usize,
    pub min_visible_text_chars: usize,
    pub min_main_content_chars: usize,
    pub require_structured_data: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_html_bytes: 2048,
            min_visible_text_chars: 600,
            min_main_content_chars: 400,
            require_structured_data: false,
        }
    }
}

/// One fired-rule or fallback-threshold entry contributing to a gatekeeper
/// decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    pub rule_id: Option<String>,
    pub matched_signals: Vec<String>,
    pub block_class: BlockClass,
    pub confidence: f32,
}

/// The complete, reproducible output of the gatekeeper for one response
/// (spec.md §4.6 "pure").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatekeeperEvidence {
    pub block_class: BlockClass,
    pub content_status: ContentStatus,
    pub confidence: f32,
    pub evidence: Vec<EvidenceEntry>,
    pub quality: QualityRecord,
    pub thresholds: Thresholds,
}
