//! `POST /crawl` handler: wires the `riptide-spider` frontier/driver to
//! the scrape pipeline (spec.md §4.11 "Crawler Frontier").

use crate::dto::CrawlRequest;
use crate::errors::ApiError;
use crate::pipeline;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::State;
use axum::Json;
use riptide_reliability::AbortTimeoutManager;
use riptide_spider::{CrawlDriver, Frontier, FrontierConfig};
use riptide_spider::frontier::{PageScraper, PageScrapeResult};
use riptide_spider::sitemap::SitemapProcessor;
use riptide_types::{Format, Meta, NeverCancelled, PublicError, ScrapeOptions};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Adapts `AppState`'s scrape pipeline to the `PageScraper` trait the
/// frontier depends on, without that crate depending on `riptide-api`.
struct PipelineScraper {
    state: AppState,
    scrape_options: ScrapeOptions,
}

#[async_trait]
impl PageScraper for PipelineScraper {
    async fn scrape(&self, url: &Url, headers: &HashMap<String, String>) -> PageScrapeResult {
        let mut options = self.scrape_options.clone();
        options.headers.extend(headers.clone());
        // rawHtml is forced on so the driver can always extract further
        // links, even when the caller did not request it back (spec.md
        // §4.11 step 3: "invoke the scrape pipeline with rawHtml added").
        options.formats.insert(Format::RawHtml);

        let timeout = options.timeout_ms.map(Duration::from_millis);
        let manager = AbortTimeoutManager::new(Arc::new(NeverCancelled), timeout);
        let meta = Meta::new(url.clone(), options, manager.signal());

        let wants_raw_html = self.scrape_options.wants(Format::RawHtml);

        match pipeline::run_scrape(&self.state, meta).await {
            Ok(mut document) => {
                let raw_html = document.raw_html.clone();
                if !wants_raw_html {
                    document.raw_html = None;
                }
                PageScrapeResult {
                    outcome: Ok(document),
                    raw_html,
                }
            }
            Err(err) => PageScrapeResult {
                outcome: Err(PublicError {
                    code: err.code().to_string(),
                    message: err.to_string(),
                }),
                raw_html: None,
            },
        }
    }
}

#[instrument(skip(state, request), fields(url = %request.url))]
pub async fn crawl(
    State(state): State<AppState>,
    Json(request): Json<CrawlRequest>,
) -> Result<Json<Value>, ApiError> {
    let initial_url = state.validator.validate_url(&request.url)?;
    let options = request.options.clamped();

    if let Some(host) = initial_url.host_str() {
        if state.blocklist.is_blocked(host) {
            return Err(ApiError::Scrape(riptide_types::ScrapeError::CrawlDenied(format!(
                "{host} is blocklisted"
            ))));
        }
    }

    let frontier_config = FrontierConfig::from_options(initial_url.clone(), &options);
    let frontier = Frontier::new(frontier_config, (*state.blocklist).clone());

    let scraper = PipelineScraper {
        state: state.clone(),
        scrape_options: options.scrape_options.clone(),
    };

    let mut driver = CrawlDriver::new(frontier, scraper)
        .with_sitemap(SitemapProcessor::new(state.dispatcher.clone()));

    if state.config.check_robots_on_scrape {
        driver = driver.with_robots(state.robots.clone(), vec!["*".to_string()]);
    }

    let outcome = driver.run().await;
    Ok(Json(serde_json::to_value(&outcome)?))
}
