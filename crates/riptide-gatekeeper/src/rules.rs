//! Gatekeeper rule configuration (spec.md §4.6 "Config").
//!
//! Rules come from an optional JSON file with a `global` section and
//! per-host `domains` overrides, each of which may carry its own
//! `thresholds` alongside its `rules`; loaded once via `OnceCell` and
//! never reloaded for the lifetime of the process.

use riptide_types::{BlockClass, Thresholds};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ContainsScript(String),
    TitleMatches(String),
    BodyTextLenLt(usize),
    StatusIn(Vec<u16>),
    RedirectToLogin(Vec<String>),
    HtmlBytesLt(usize),
    VisibleTextLenLt(usize),
    MainContentLenLt(usize),
    HasStructuredData(bool),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub id: String,
    pub block_class: BlockClass,
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// One `global` or per-host `domains` entry: a rule list plus an optional
/// threshold override for that scope (spec.md §4.6 step 4).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleSection {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleSet {
    #[serde(default)]
    pub global: Option<RuleSection>,
    #[serde(default)]
    pub domains: HashMap<String, RuleSection>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Rules that apply to `host`: the global set plus any host-specific
    /// overrides, host rules evaluated first so a narrower rule can fire
    /// before a broad global one on the same signal set.
    pub fn rules_for_host<'a>(&'a self, host: &str) -> Vec<&'a Rule> {
        let mut rules: Vec<&Rule> = self
            .domains
            .get(host)
            .map(|section| section.rules.iter().collect())
            .unwrap_or_default();
        if let Some(global) = &self.global {
            rules.extend(global.rules.iter());
        }
        rules
    }

    /// Resolves the thresholds that apply to `host` (spec.md §4.6 step 4):
    /// a per-host override in the rules file wins, then the file's global
    /// override, then `fallback` (the deployment's env/default thresholds).
    pub fn thresholds_for_host(&self, host: &str, fallback: Thresholds) -> Thresholds {
        self.domains
            .get(host)
            .and_then(|section| section.thresholds)
            .or_else(|| self.global.as_ref().and_then(|section| section.thresholds))
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_ruleset() {
        let json = r#"{
            "global": {
                "rules": [
                    {
                        "id": "thin-body",
                        "block_class": "thin",
                        "signals": [{"body_text_len_lt": 200}]
                    }
                ]
            },
            "domains": {
                "example.com": {
                    "rules": [
                        {
                            "id": "example-login",
                            "block_class": "login",
                            "signals": [{"redirect_to_login": ["/login", "/signin"]}],
                            "confidence": 0.9
                        }
                    ]
                }
            }
        }"#;
        let rule_set = RuleSet::from_json(json).unwrap();
        assert_eq!(rule_set.global.as_ref().unwrap().rules.len(), 1);
        let host_rules = rule_set.rules_for_host("example.com");
        assert_eq!(host_rules.len(), 2);
        assert_eq!(host_rules[0].id, "example-login");
    }

    #[test]
    fn host_without_overrides_falls_back_to_global_only() {
        let rule_set = RuleSet::from_json(
            r#"{"global": {"rules": [{"id": "a", "block_class": "thin", "signals": []}]}}"#,
        )
        .unwrap();
        assert_eq!(rule_set.rules_for_host("other.com").len(), 1);
    }

    #[test]
    fn per_host_thresholds_override_global_and_fallback() {
        let rule_set = RuleSet::from_json(
            r#"{
                "global": {"rules": [], "thresholds": {"min_html_bytes": 1000, "min_visible_text_chars": 300, "min_main_content_chars": 200, "require_structured_data": false}},
                "domains": {"example.com": {"rules": [], "thresholds": {"min_html_bytes": 50, "min_visible_text_chars": 10, "min_main_content_chars": 5, "require_structured_data": true}}}
            }"#,
        )
        .unwrap();
        let fallback = Thresholds::default();
        assert_eq!(rule_set.thresholds_for_host("example.com", fallback).min_html_bytes, 50);
        assert_eq!(rule_set.thresholds_for_host("other.com", fallback).min_html_bytes, 1000);
    }

    #[test]
    fn missing_file_level_thresholds_falls_back_to_supplied_default() {
        let rule_set = RuleSet::empty();
        let fallback = Thresholds::default();
        assert_eq!(rule_set.thresholds_for_host("example.com", fallback), fallback);
    }
}
