//! Crawler Frontier (spec.md §4.11, C12): the bounded, robots-aware BFS
//! that discovers URLs via sitemap and in-page links, filters them, and
//! feeds them back through the scrape pipeline with backpressure.

use crate::filter::{filter_link, FilterPolicy};
use crate::sitemap::SitemapProcessor;
use regex::Regex;
use riptide_fetch::RobotsEvaluator;
use riptide_security::DomainBlocklist;
use riptide_types::{CrawlOptions, CrawlOutcome, CrawlPageError, CrawlStats, Document, PublicError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Static configuration for one crawl (spec.md §4.11 "Constructed with").
pub struct FrontierConfig {
    pub initial_url: Url,
    pub includes: Vec<Regex>,
    pub excludes: Vec<Regex>,
    pub limit: usize,
    pub max_depth: usize,
    pub allow_backward_crawling: bool,
    pub allow_external_content_links: bool,
    pub allow_subdomains: bool,
    pub regex_on_full_url: bool,
    pub headers: HashMap<String, String>,
}

impl FrontierConfig {
    /// Compiles a `FrontierConfig` from the wire-level `CrawlOptions`,
    /// silently dropping any `includes`/`excludes` pattern that fails to
    /// compile as a regex (spec.md leaves malformed-pattern handling to
    /// the implementer; skipping keeps one bad pattern from failing the
    /// whole crawl).
    pub fn from_options(initial_url: Url, options: &CrawlOptions) -> Self {
        let compile = |patterns: &[String]| -> Vec<Regex> {
            patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        warn!(pattern, error = %err, "crawl regex failed to compile, ignoring");
                        None
                    }
                })
                .collect()
        };
        Self {
            initial_url,
            includes: compile(&options.includes),
            excludes: compile(&options.excludes),
            limit: options.limit,
            max_depth: options.max_depth,
            allow_backward_crawling: options.allow_backward_crawling,
            allow_external_content_links: options.allow_external_content_links,
            allow_subdomains: options.allow_subdomains,
            regex_on_full_url: options.regex_on_full_url,
            headers: options.headers.clone(),
        }
    }
}

struct QueueItem {
    url: Url,
    depth: usize,
}

/// The frontier's own two sets — `discovered` (anything ever enqueued)
/// and `processed` (anything dequeued) — plus the FIFO queue itself
/// (spec.md §4.11 "Maintain two sets").
pub struct Frontier {
    config: FrontierConfig,
    blocklist: DomainBlocklist,
    queue: VecDeque<QueueItem>,
    discovered: HashSet<String>,
    processed: usize,
}

impl Frontier {
    pub fn new(config: FrontierConfig, blocklist: DomainBlocklist) -> Self {
        let mut frontier = Self {
            config,
            blocklist,
            queue: VecDeque::new(),
            discovered: HashSet::new(),
            processed: 0,
        };
        frontier.seed_initial();
        frontier
    }

    fn seed_initial(&mut self) {
        let initial = self.config.initial_url.clone();
        self.discovered.insert(initial.as_str().to_string());
        self.queue.push_back(QueueItem {
            url: initial,
            depth: 0,
        });
    }

    fn policy(&self) -> FilterPolicy<'_> {
        FilterPolicy {
            initial_url: &self.config.initial_url,
            includes: &self.config.includes,
            excludes: &self.config.excludes,
            regex_on_full_url: self.config.regex_on_full_url,
            allow_subdomains: self.config.allow_subdomains,
            allow_external_content_links: self.config.allow_external_content_links,
            allow_backward_crawling: self.config.allow_backward_crawling,
            blocklist: &self.blocklist,
        }
    }

    /// Sitemap-discovered URLs are seeded at depth 0, same as the initial
    /// URL — they did not come from following a link at some depth, so
    /// there is no parent depth to add one to (spec.md §4.11 step 2:
    /// "enqueue each emitted URL through the same filter that applies to
    /// in-page links").
    pub fn seed_sitemap_urls(&mut self, urls: impl IntoIterator<Item = Url>) {
        for url in urls {
            if self.remaining_capacity() == 0 {
                break;
            }
            self.try_enqueue(url.as_str(), 0);
        }
    }

    /// In-page links discovered on a page at `from_depth`; each admitted
    /// link is enqueued at `from_depth + 1` (spec.md §4.11 step 4). A
    /// no-op if `from_depth + 1` would exceed `max_depth`.
    pub fn enqueue_discovered(&mut self, links: impl IntoIterator<Item = String>, from_depth: usize) {
        let next_depth = from_depth + 1;
        if next_depth > self.config.max_depth {
            return;
        }
        for link in links {
            if self.remaining_capacity() == 0 {
                break;
            }
            self.try_enqueue(&link, next_depth);
        }
    }

    fn try_enqueue(&mut self, link: &str, depth: usize) {
        let policy = self.policy();
        let Some(url) = filter_link(link, &self.discovered, &policy) else {
            return;
        };
        let key = url.as_str().to_string();
        if self.discovered.insert(key) {
            debug!(url = %url, depth, "enqueued");
            self.queue.push_back(QueueItem { url, depth });
        }
    }

    /// `limit - discovered` — the discovery budget spec.md §4.11 step 4
    /// bounds new enqueues by ("enqueue new ones up to the remaining
    /// limit").
    fn remaining_capacity(&self) -> usize {
        self.config.limit.saturating_sub(self.discovered.len())
    }

    /// Pops the next URL in FIFO order, or `None` once the queue is empty
    /// or `processed` has reached `limit` (I4, I5).
    pub fn pop(&mut self) -> Option<(Url, usize)> {
        if self.processed >= self.config.limit {
            return None;
        }
        let item = self.queue.pop_front()?;
        self.processed += 1;
        Some((item.url, item.depth))
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn processed_count(&self) -> usize {
        self.processed
    }

    pub fn limit(&self) -> usize {
        self.config.limit
    }

    pub fn max_depth(&self) -> usize {
        self.config.max_depth
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.config.headers
    }
}

/// What the frontier needs back from one scrape attempt to keep driving
/// the crawl: the public outcome (for `pages`/`errors`) plus the raw HTML
/// body, when present, so the driver can extract further links.
pub struct PageScrapeResult {
    pub outcome: Result<Document, PublicError>,
    pub raw_html: Option<String>,
}

/// The scrape pipeline as the frontier needs to call it — implemented by
/// `riptide-api`'s fallback orchestrator. Kept as a trait here (rather
/// than a concrete dependency on `riptide-api`) so the frontier does not
/// depend on the crate that depends on it.
#[async_trait::async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &Url, headers: &HashMap<String, String>) -> PageScrapeResult;
}

/// Drives a `Frontier` end to end: sitemap discovery, then FIFO
/// popping through a `PageScraper`, feeding extracted links back into
/// the frontier up to `maxDepth` (spec.md §4.11 "Discovery").
pub struct CrawlDriver<S: PageScraper> {
    frontier: Frontier,
    sitemap: Option<SitemapProcessor>,
    robots: Option<Arc<RobotsEvaluator>>,
    robots_user_agents: Vec<String>,
    scraper: S,
}

impl<S: PageScraper> CrawlDriver<S> {
    pub fn new(frontier: Frontier, scraper: S) -> Self {
        Self {
            frontier,
            sitemap: None,
            robots: None,
            robots_user_agents: vec!["*".to_string()],
            scraper,
        }
    }

    /// Enables sitemap-based seeding (spec.md §4.11 step 2).
    pub fn with_sitemap(mut self, sitemap: SitemapProcessor) -> Self {
        self.sitemap = Some(sitemap);
        self
    }

    /// Enables the robots.txt check (only consulted when the deployment's
    /// `checkRobotsOnScrape` policy is true — spec.md §4.9).
    pub fn with_robots(mut self, robots: Arc<RobotsEvaluator>, user_agents: Vec<String>) -> Self {
        self.robots = Some(robots);
        if !user_agents.is_empty() {
            self.robots_user_agents = user_agents;
        }
        self
    }

    pub async fn run(mut self) -> CrawlOutcome {
        if let Some(sitemap) = self.sitemap.as_mut() {
            let root = self.frontier.config.initial_url.clone();
            let mut batches: Vec<Url> = Vec::new();
            sitemap.walk(root, |urls| batches.extend(urls)).await;
            self.frontier.seed_sitemap_urls(batches);
        }

        let mut pages = Vec::new();
        let mut errors = Vec::new();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        while let Some((url, depth)) = self.frontier.pop() {
            if let Some(robots) = &self.robots {
                if !robots.is_allowed(&url, &self.robots_user_agents).await {
                    debug!(%url, "crawl denied by robots.txt");
                    failed += 1;
                    errors.push(CrawlPageError {
                        url: url.to_string(),
                        error: PublicError {
                            code: "CRAWL_DENIED".to_string(),
                            message: "blocked by robots.txt".to_string(),
                        },
                    });
                    continue;
                }
            }

            let headers = self.frontier.headers().clone();
            let result = self.scraper.scrape(&url, &headers).await;

            match result.outcome {
                Ok(document) => {
                    succeeded += 1;
                    if let Some(html) = result.raw_html {
                        let links = riptide_html::links::extract(&html, &url);
                        self.frontier.enqueue_discovered(links, depth);
                    }
                    pages.push(document);
                }
                Err(error) => {
                    failed += 1;
                    errors.push(CrawlPageError {
                        url: url.to_string(),
                        error,
                    });
                }
            }
        }

        let stats = CrawlStats {
            discovered: self.frontier.discovered_count(),
            processed: self.frontier.processed_count(),
            succeeded,
            failed,
            limit: self.frontier.limit(),
        };

        CrawlOutcome {
            success: true,
            pages,
            errors,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(initial: &str, limit: usize, max_depth: usize) -> FrontierConfig {
        FrontierConfig {
            initial_url: Url::parse(initial).unwrap(),
            includes: Vec::new(),
            excludes: Vec::new(),
            limit,
            max_depth,
            allow_backward_crawling: false,
            allow_external_content_links: false,
            allow_subdomains: false,
            regex_on_full_url: false,
            headers: HashMap::new(),
        }
    }

    #[test]
    fn seeds_initial_url_at_depth_zero() {
        let mut frontier = Frontier::new(config("https://example.com/", 10, 2), DomainBlocklist::empty());
        let (url, depth) = frontier.pop().unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
        assert_eq!(depth, 0);
    }

    #[test]
    fn never_enqueues_same_url_twice_within_a_crawl() {
        let mut frontier = Frontier::new(config("https://example.com/", 10, 2), DomainBlocklist::empty());
        frontier.enqueue_discovered(
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/a".to_string(),
            ],
            0,
        );
        assert_eq!(frontier.discovered_count(), 2); // initial + /a
        frontier.pop(); // consume the initial URL
        let (url, _) = frontier.pop().unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn does_not_enqueue_beyond_max_depth() {
        let mut frontier = Frontier::new(config("https://example.com/", 10, 1), DomainBlocklist::empty());
        // from_depth=1 -> next_depth=2, exceeds max_depth=1
        frontier.enqueue_discovered(vec!["https://example.com/deep".to_string()], 1);
        assert_eq!(frontier.discovered_count(), 1); // only the initial URL
    }

    #[test]
    fn processed_never_exceeds_limit() {
        let mut frontier = Frontier::new(config("https://example.com/", 1, 5), DomainBlocklist::empty());
        frontier.enqueue_discovered(vec!["https://example.com/a".to_string()], 0);
        assert!(frontier.pop().is_some());
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn enqueue_respects_remaining_capacity() {
        let mut frontier = Frontier::new(config("https://example.com/", 2, 5), DomainBlocklist::empty());
        frontier.enqueue_discovered(
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ],
            0,
        );
        // limit=2: initial URL already used one slot, only "/a" fits.
        assert_eq!(frontier.discovered_count(), 2);
    }
}
