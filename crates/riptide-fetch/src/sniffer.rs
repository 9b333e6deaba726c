//! Specialty Sniffer (spec.md §4.5, C6): maps a response `Content-Type`
//! onto a feature-flag escalation the orchestrator reacts to by switching
//! engines and restarting the fallback list.

use riptide_types::FeatureFlag;

const OFFICE_DOCUMENT_PREFIXES: &[&str] = &[
    // docx
    "application/vnd.openxmlformats-officedocument.wordprocessingml",
    // odt
    "application/vnd.oasis.opendocument.text",
    // rtf
    "application/rtf",
    "text/rtf",
    // xlsx / xls
    "application/vnd.openxmlformats-officedocument.spreadsheetml",
    "application/vnd.ms-excel",
    // legacy doc
    "application/msword",
];

/// `Some(flag)` when the content type demands escalation to the PDF or
/// Document engine; `None` when the Fetch engine's own output is fine.
pub fn sniff(content_type: &str) -> Option<FeatureFlag> {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase();

    if base == "application/pdf" {
        return Some(FeatureFlag::Pdf);
    }
    if OFFICE_DOCUMENT_PREFIXES
        .iter()
        .any(|prefix| base.starts_with(prefix))
    {
        return Some(FeatureFlag::Document);
    }
    None
}
