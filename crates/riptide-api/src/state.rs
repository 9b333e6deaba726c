//! Shared application state (spec.md §5 "Concurrency & Resource Model"):
//! one long-lived instance of every engine and support service, cloned
//! cheaply into each request handler via `Arc`.

use crate::config::AppConfig;
use riptide_browser::BrowserEngine;
use riptide_fetch::{FetchEngine, RobotsEvaluator};
use riptide_pdf::{DocumentEngine, PdfEngine};
use riptide_security::{DispatcherPolicy, DomainBlocklist, InputValidator, SecureDispatcher};
use riptide_types::Thresholds;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<SecureDispatcher>,
    pub fetch_engine: Arc<FetchEngine>,
    pub browser_engine: Option<Arc<BrowserEngine>>,
    pub pdf_engine: Arc<PdfEngine>,
    pub document_engine: Arc<DocumentEngine>,
    pub robots: Arc<RobotsEvaluator>,
    pub validator: Arc<InputValidator>,
    pub blocklist: Arc<DomainBlocklist>,
    pub gatekeeper_thresholds: Thresholds,
}

impl AppState {
    pub fn build(config: AppConfig) -> anyhow::Result<Self> {
        let policy = DispatcherPolicy {
            allow_local_webhooks: config.allow_local_webhooks,
            proxy: config.proxy.clone(),
            ..DispatcherPolicy::default()
        };
        let dispatcher = SecureDispatcher::new(policy)?;

        let browser_engine = config
            .playwright_microservice_url
            .clone()
            .map(|url| Arc::new(BrowserEngine::new(dispatcher.clone(), url)));

        Ok(Self {
            gatekeeper_thresholds: config.gatekeeper_thresholds.clone(),
            fetch_engine: Arc::new(FetchEngine::new(dispatcher.clone())),
            robots: Arc::new(RobotsEvaluator::new(dispatcher.clone())),
            pdf_engine: Arc::new(PdfEngine::new(dispatcher.clone())),
            document_engine: Arc::new(DocumentEngine::new(dispatcher.clone())),
            browser_engine,
            validator: Arc::new(InputValidator::new_default()),
            blocklist: Arc::new(DomainBlocklist::empty()),
            config: Arc::new(config),
            dispatcher,
        })
    }
}
