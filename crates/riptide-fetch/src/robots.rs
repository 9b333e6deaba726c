//! Robots Evaluator (spec.md §4.9, C10).
//!
//! Per-host caching via `DashMap`, with `robotstxt::DefaultMatcher` for the
//! actual rule match. Just the allow/deny contract: no rate limiting here,
//! since that belongs to the crawler frontier's own pacing, not to this
//! evaluator.

use dashmap::DashMap;
use riptide_security::{DispatcherKey, SecureDispatcher};
use robotstxt::DefaultMatcher;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
struct CachedRobotsText {
    content: String,
    fetched_at: Instant,
}

impl CachedRobotsText {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }
}

pub struct RobotsEvaluator {
    dispatcher: Arc<SecureDispatcher>,
    cache: DashMap<String, CachedRobotsText>,
    ttl: Duration,
}

impl RobotsEvaluator {
    pub fn new(dispatcher: Arc<SecureDispatcher>) -> Self {
        Self {
            dispatcher,
            cache: DashMap::new(),
            ttl: Duration::from_secs(3600),
        }
    }

    /// `true` when any of `user_agent_tokens` is allowed to fetch `url`.
    /// Only called when the deployment's `checkRobotsOnScrape` policy is
    /// enabled — the caller decides that, not this evaluator.
    pub async fn is_allowed(&self, url: &Url, user_agent_tokens: &[String]) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        let robots_txt = self.get_or_fetch(url.scheme(), host).await;

        for token in user_agent_tokens {
            if self.check_with_trailing_slash_retry(&robots_txt, token, url) {
                return true;
            }
        }
        false
    }

    /// One user-agent token against one URL, including the trailing-slash
    /// retry rule: if the URL doesn't end in `/`, the same check repeats
    /// with a trailing slash appended, and an explicit disallow there also
    /// blocks the original.
    fn check_with_trailing_slash_retry(&self, robots_txt: &str, user_agent: &str, url: &Url) -> bool {
        let mut matcher = DefaultMatcher::default();
        let primary_allowed =
            matcher.one_agent_allowed_by_robots(robots_txt, user_agent, url.as_str());

        if !url.path().ends_with('/') {
            let mut with_slash = url.clone();
            with_slash.set_path(&format!("{}/", url.path()));
            let mut matcher = DefaultMatcher::default();
            let slash_allowed =
                matcher.one_agent_allowed_by_robots(robots_txt, user_agent, with_slash.as_str());
            return primary_allowed && slash_allowed;
        }

        primary_allowed
    }

    async fn get_or_fetch(&self, scheme: &str, host: &str) -> String {
        if let Some(cached) = self.cache.get(host) {
            if !cached.is_expired(self.ttl) {
                return cached.content.clone();
            }
        }

        let robots_url = format!("{scheme}://{host}/robots.txt");
        let content = match self.fetch(&robots_url).await {
            Ok(text) => text,
            Err(err) => {
                warn!(host, error = %err, "robots.txt unavailable, allowing all");
                String::new()
            }
        };

        self.cache.insert(
            host.to_string(),
            CachedRobotsText {
                content: content.clone(),
                fetched_at: Instant::now(),
            },
        );
        content
    }

    async fn fetch(&self, robots_url: &str) -> Result<String, String> {
        let parsed = Url::parse(robots_url).map_err(|e| e.to_string())?;
        self.dispatcher
            .guard_host(&parsed)
            .map_err(|e| e.to_string())?;

        let client = self
            .dispatcher
            .client(DispatcherKey::new(false, false));
        let response = client.get(robots_url).send().await.map_err(|e| e.to_string())?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(robots_url, "robots.txt not found, allowing all");
            return Ok(String::new());
        }
        if !response.status().is_success() {
            return Err(format!("robots.txt fetch returned {}", response.status()));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_security::DispatcherPolicy;

    fn evaluator() -> RobotsEvaluator {
        let dispatcher = SecureDispatcher::new(DispatcherPolicy::default()).unwrap();
        RobotsEvaluator::new(dispatcher)
    }

    #[test]
    fn trailing_slash_retry_blocks_when_slash_form_disallowed() {
        let eval = evaluator();
        let robots = "User-agent: *\nDisallow: /private/\n";
        let url = Url::parse("https://example.com/private").unwrap();
        assert!(!eval.check_with_trailing_slash_retry(robots, "*", &url));
    }

    #[test]
    fn allows_when_no_rule_matches() {
        let eval = evaluator();
        let robots = "User-agent: *\nDisallow: /admin/\n";
        let url = Url::parse("https://example.com/public").unwrap();
        assert!(eval.check_with_trailing_slash_retry(robots, "*", &url));
    }

    #[test]
    fn empty_robots_allows_all() {
        let eval = evaluator();
        let url = Url::parse("https://example.com/anything").unwrap();
        assert!(eval.check_with_trailing_slash_retry("", "*", &url));
    }
}
