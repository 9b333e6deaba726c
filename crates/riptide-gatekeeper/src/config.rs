//! Loads the gatekeeper rule file once per process (spec.md §4.6 "Config"
//! — rules are not hot-reloaded).

use crate::rules::RuleSet;
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::warn;

static RULE_SET: OnceCell<RuleSet> = OnceCell::new();

/// Loads `path` on first call and caches the result for the process
/// lifetime; subsequent calls (with any path) return the cached value.
/// Missing file or parse failure falls back to an empty rule set (only
/// the threshold fallback applies) with a warning.
pub fn rule_set(path: Option<&Path>) -> &'static RuleSet {
    RULE_SET.get_or_init(|| match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(data) => match RuleSet::from_json(&data) {
                Ok(rule_set) => rule_set,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to parse gatekeeper rules, using thresholds only");
                    RuleSet::empty()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "gatekeeper rules file not found, using thresholds only");
                RuleSet::empty()
            }
        },
        None => RuleSet::empty(),
    })
}
