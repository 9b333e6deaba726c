//! Conditional-GET HTTP fetch engine (C2), content-type sniffer (C6) and
//! robots.txt evaluator (C10) — the HTTP-facing half of the scrape
//! pipeline, built on top of `riptide-security`'s Secure Dispatcher.

pub mod cache;
pub mod charset;
pub mod engine;
pub mod robots;
pub mod sniffer;

pub use cache::{CachedValidators, ConditionalGetCache};
pub use engine::FetchEngine;
pub use robots::RobotsEvaluator;
