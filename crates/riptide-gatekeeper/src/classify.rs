//! The gatekeeper's classify algorithm (spec.md §4.6 steps 1-5). Pure: the
//! same inputs always produce byte-identical evidence.

use crate::quality;
use crate::rules::RuleSet;
use crate::signals::{self, ClassifyFacts};
use riptide_types::{BlockClass, EvidenceEntry, GatekeeperEvidence, Thresholds};

pub struct ClassifyInput<'a> {
    pub html: &'a str,
    pub title: Option<&'a str>,
    pub status: u16,
    pub final_url: &'a str,
    pub host: &'a str,
    pub rule_set: &'a RuleSet,
    pub thresholds: Thresholds,
}

pub fn classify(input: &ClassifyInput) -> GatekeeperEvidence {
    let quality = quality::compute(input.html);
    let facts = ClassifyFacts {
        html: input.html,
        title: input.title,
        status: input.status,
        final_url: input.final_url,
        quality: &quality,
    };

    let rules = input.rule_set.rules_for_host(input.host);
    let mut fired: Vec<EvidenceEntry> = Vec::new();

    for rule in &rules {
        let matched_signals: Vec<String> = rule.signals.iter().map(signals::label).collect();
        let all_match = rule.signals.iter().all(|signal| signals::matches(signal, &facts));
        if all_match {
            fired.push(EvidenceEntry {
                rule_id: Some(rule.id.clone()),
                matched_signals,
                block_class: rule.block_class,
                confidence: rule.confidence.unwrap_or(1.0),
            });
        }
    }

    if !fired.is_empty() {
        fired.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
        let winner = fired[0].clone();
        return GatekeeperEvidence {
            block_class: winner.block_class,
            content_status: winner.block_class.into(),
            confidence: winner.confidence,
            evidence: fired,
            quality,
            thresholds: input.thresholds,
        };
    }

    apply_thresholds(quality, input.thresholds)
}

fn apply_thresholds(quality: riptide_types::QualityRecord, thresholds: Thresholds) -> GatekeeperEvidence {
    let mut failing = Vec::new();
    if quality.html_bytes < thresholds.min_html_bytes {
        failing.push("html_bytes_lt".to_string());
    }
    if quality.visible_text_chars < thresholds.min_visible_text_chars {
        failing.push("visible_text_len_lt".to_string());
    }
    if quality.main_content_chars < thresholds.min_main_content_chars {
        failing.push("main_content_len_lt".to_string());
    }
    if thresholds.require_structured_data && !quality.has_structured_data {
        failing.push("has_structured_data".to_string());
    }

    if failing.is_empty() {
        return GatekeeperEvidence {
            block_class: BlockClass::None,
            content_status: BlockClass::None.into(),
            confidence: 1.0,
            evidence: Vec::new(),
            quality,
            thresholds,
        };
    }

    let confidence = (0.4 + 0.15 * failing.len() as f32).min(1.0);
    GatekeeperEvidence {
        block_class: BlockClass::Thin,
        content_status: BlockClass::Thin.into(),
        confidence,
        evidence: vec![EvidenceEntry {
            rule_id: None,
            matched_signals: failing,
            block_class: BlockClass::Thin,
            confidence,
        }],
        quality,
        thresholds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_when_no_rules_and_thresholds_pass() {
        let rule_set = RuleSet::empty();
        let html = format!("<html><body><main>{}</main></body></html>", "word ".repeat(500));
        let input = ClassifyInput {
            html: &html,
            title: Some("A real title"),
            status: 200,
            final_url: "https://example.com/article",
            host: "example.com",
            rule_set: &rule_set,
            thresholds: Thresholds::default(),
        };
        let evidence = classify(&input);
        assert_eq!(evidence.block_class, BlockClass::None);
        assert_eq!(evidence.content_status, riptide_types::ContentStatus::Usable);
    }

    #[test]
    fn thin_when_thresholds_fail_with_no_rules() {
        let rule_set = RuleSet::empty();
        let input = ClassifyInput {
            html: "<html><body>short</body></html>",
            title: None,
            status: 200,
            final_url: "https://example.com/",
            host: "example.com",
            rule_set: &rule_set,
            thresholds: Thresholds::default(),
        };
        let evidence = classify(&input);
        assert_eq!(evidence.block_class, BlockClass::Thin);
        assert!(evidence.confidence >= 0.4);
    }

    #[test]
    fn rule_match_wins_over_thresholds() {
        let rule_set = RuleSet::from_json(
            r#"{"global": {"rules": [{"id": "login-redirect", "block_class": "login", "signals": [{"redirect_to_login": ["/login"]}], "confidence": 0.95}]}}"#,
        )
        .unwrap();
        let input = ClassifyInput {
            html: "<html><body>some content here that is reasonably long for a body</body></html>",
            title: None,
            status: 200,
            final_url: "https://example.com/login",
            host: "example.com",
            rule_set: &rule_set,
            thresholds: Thresholds::default(),
        };
        let evidence = classify(&input);
        assert_eq!(evidence.block_class, BlockClass::Login);
        assert_eq!(evidence.confidence, 0.95);
    }

    #[test]
    fn highest_confidence_rule_wins_when_multiple_fire() {
        let rule_set = RuleSet::from_json(
            r#"{"global": {"rules": [
                {"id": "low", "block_class": "thin", "signals": [{"status_in": [200]}], "confidence": 0.3},
                {"id": "high", "block_class": "challenge", "signals": [{"status_in": [200]}], "confidence": 0.9}
            ]}}"#,
        )
        .unwrap();
        let input = ClassifyInput {
            html: "<html></html>",
            title: None,
            status: 200,
            final_url: "https://example.com/",
            host: "example.com",
            rule_set: &rule_set,
            thresholds: Thresholds::default(),
        };
        let evidence = classify(&input);
        assert_eq!(evidence.block_class, BlockClass::Challenge);
        assert_eq!(evidence.evidence.len(), 2);
    }
}
