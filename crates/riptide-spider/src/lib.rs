//! Sitemap Processor (C11) and Crawler Frontier (C12): discovers URLs via
//! sitemap and in-page links, filters them, and drives a bounded BFS over
//! the scrape pipeline.

pub mod filter;
pub mod frontier;
pub mod sitemap;

pub use filter::{filter_link, FilterPolicy};
pub use frontier::{CrawlDriver, Frontier, FrontierConfig};
pub use sitemap::{SitemapProcessor, SITEMAP_LIMIT};
