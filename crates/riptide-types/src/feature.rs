//! Feature flags: the closed set of markers that influence engine-list
//! construction (spec.md §3, §4.7).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    Pdf,
    Document,
    WaitFor,
}

pub type FeatureSet = HashSet<FeatureFlag>;

/// Derives the initial feature set from a URL's path suffix, before the
/// first engine attempt (spec.md §3 "Feature flags").
pub fn detect_from_url(url: &url::Url) -> FeatureSet {
    let mut flags = FeatureSet::new();
    let path = url.path().to_lowercase();
    if path.ends_with(".pdf") {
        flags.insert(FeatureFlag::Pdf);
    } else if is_document_suffix(&path) {
        flags.insert(FeatureFlag::Document);
    }
    flags
}

fn is_document_suffix(path: &str) -> bool {
    const SUFFIXES: &[&str] = &[".docx", ".odt", ".rtf", ".xlsx", ".xls", ".doc"];
    SUFFIXES.iter().any(|s| path.ends_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_suffix_sets_pdf_flag() {
        let url = url::Url::parse("https://example.com/paper.PDF").unwrap();
        assert!(detect_from_url(&url).contains(&FeatureFlag::Pdf));
    }

    #[test]
    fn docx_suffix_sets_document_flag() {
        let url = url::Url::parse("https://example.com/report.docx").unwrap();
        assert!(detect_from_url(&url).contains(&FeatureFlag::Document));
    }

    #[test]
    fn html_path_sets_no_flags() {
        let url = url::Url::parse("https://example.com/article").unwrap();
        assert!(detect_from_url(&url).is_empty());
    }
}
