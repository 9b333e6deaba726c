//! The Gatekeeper (C7): pure, rule-then-threshold classification of a
//! fetched response into a block-class and content-status.

pub mod classify;
pub mod config;
pub mod quality;
pub mod rules;
pub mod signals;

pub use classify::{classify, ClassifyInput};
pub use config::rule_set;
pub use rules::{Rule, RuleSection, RuleSet, Signal};
