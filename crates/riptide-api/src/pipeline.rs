//! The Fallback Orchestrator (spec.md §4.7, C8): engine-order construction,
//! the escalation/acceptance loop, and finalization into a [`Document`].

use crate::state::AppState;
use riptide_gatekeeper::{classify, ClassifyInput};
use riptide_types::{
    CancellationKind, DocumentMetadata, EngineDomainError, EngineOutcome, EngineResult,
    FeatureFlag, Format, GatekeeperEvidence, Meta, ScrapeError, TransportError,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

use riptide_types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Engine {
    Document,
    Pdf,
    Browser,
    Fetch,
}

/// Builds the deterministic engine order for the current feature flags
/// (spec.md §4.7 "Engine-order construction").
fn build_engine_order(meta: &Meta, has_browser: bool) -> Vec<Engine> {
    let mut order = Vec::with_capacity(3);
    if meta.feature_flags.contains(&FeatureFlag::Document) {
        order.push(Engine::Document);
    } else if meta.feature_flags.contains(&FeatureFlag::Pdf) {
        order.push(Engine::Pdf);
    }
    if has_browser {
        order.push(Engine::Browser);
    }
    order.push(Engine::Fetch);
    order
}

/// Runs one scrape end to end and returns the finished [`Document`], or the
/// terminal [`ScrapeError`] if no engine accepted the URL.
pub async fn run_scrape(state: &AppState, mut meta: Meta) -> Result<Document, ScrapeError> {
    let started = Instant::now();
    let overall_timeout = meta
        .options
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(60));

    let headers = meta.options.headers.clone();
    let mut last_error: Option<ScrapeError> = None;

    for round in 0..3 {
        if let Err(kind) = meta.check_cancelled() {
            return Err(cancellation_error(kind));
        }

        let order = build_engine_order(&meta, state.browser_engine.is_some());
        let mut escalated = false;

        for engine in order {
            if let Err(kind) = meta.check_cancelled() {
                return Err(cancellation_error(kind));
            }

            let remaining_budget = overall_timeout.saturating_sub(started.elapsed());
            let outcome = run_engine(state, &meta, &headers, engine, remaining_budget).await;

            match outcome {
                EngineOutcome::Escalate(flags) => {
                    info!(?engine, ?flags, "engine requested a feature escalation");
                    meta.add_feature_flags(flags);
                    escalated = true;
                    break;
                }
                EngineOutcome::Transport(err) => {
                    warn!(?engine, error = %err, "engine transport failure, advancing");
                    last_error = Some(err.into());
                }
                EngineOutcome::Domain(err) => {
                    warn!(?engine, error = %err, "engine domain failure, advancing");
                    last_error = Some(err.into());
                }
                EngineOutcome::Cancelled(kind) => return Err(cancellation_error(kind)),
                EngineOutcome::Unsuccessful(message) => {
                    warn!(?engine, message, "engine unsuccessful, advancing");
                    last_error = Some(ScrapeError::Internal(message));
                }
                EngineOutcome::Ok(result) => {
                    let accepted = is_acceptable(&meta, &result);
                    if accepted {
                        return Ok(finalize(state, &meta, engine, result));
                    }
                    warn!(?engine, status = result.status, "engine produced insufficient content, advancing");
                    last_error = Some(ScrapeError::Domain(EngineDomainError::EngineUnsuccessful(
                        format!("{engine:?} produced insufficient content"),
                    )));
                }
            }
        }

        if !escalated {
            break;
        }
        let _ = round;
    }

    Err(last_error.unwrap_or(ScrapeError::NoEnginesLeft))
}

async fn run_engine(
    state: &AppState,
    meta: &Meta,
    headers: &HashMap<String, String>,
    engine: Engine,
    remaining_budget: Duration,
) -> EngineOutcome {
    match engine {
        Engine::Document => state.document_engine.fetch(meta).await,
        Engine::Pdf => state.pdf_engine.fetch(meta, remaining_budget).await,
        Engine::Browser => match &state.browser_engine {
            Some(browser) => browser.render(meta, headers, false).await,
            None => EngineOutcome::Unsuccessful("browser engine not configured".to_string()),
        },
        Engine::Fetch => state.fetch_engine.fetch(meta, headers).await,
    }
}

fn cancellation_error(kind: CancellationKind) -> ScrapeError {
    ScrapeError::Cancelled(kind)
}

/// Acceptance predicate (spec.md §4.7 step 4): accept if the derived
/// Markdown (or the cleaned HTML, trimmed) is non-empty, or the status
/// falls outside the success range, in which case a definitive non-2xx
/// short-circuits further fallback.
fn is_acceptable(meta: &Meta, result: &EngineResult) -> bool {
    if !result.is_success_status() {
        return true;
    }
    if !meta.options.wants_markdown_derived_html() {
        return !result.html.trim().is_empty();
    }

    let Ok(base_url) = Url::parse(&result.final_url) else {
        return !result.html.trim().is_empty();
    };
    let markdown = render_markdown(&result.html, &base_url, true);
    if !markdown.trim().is_empty() {
        return true;
    }
    !render_markdown(&result.html, &base_url, false).trim().is_empty()
}

/// Main-content mode cleans the HTML down to `<main>`/`<article>` before
/// conversion; `riptide_html::cleanup::clean` falls back to the full HTML
/// when neither tag is present, so this never discards content that exists
/// nowhere else on the page (spec.md §4.7 step 3).
fn render_markdown(html: &str, base_url: &Url, main_content_mode: bool) -> String {
    let include_tags = if main_content_mode {
        vec!["main".to_string(), "article".to_string()]
    } else {
        Vec::new()
    };
    let options = riptide_html::CleanupOptions {
        include_tags: &include_tags,
        exclude_tags: &[],
        remove_base64_images: false,
    };
    let cleaned = riptide_html::clean(html, base_url, &options);
    riptide_html::markdown::convert(&cleaned, base_url)
}

/// Finalization (spec.md §4.7 "Finalization"): builds the `Document` by
/// running each transformer in fixed order, catching and logging per
/// transformer errors rather than failing the whole request.
fn finalize(state: &AppState, meta: &Meta, engine: Engine, result: EngineResult) -> Document {
    let mut document = Document::default();
    let options = &meta.options;

    let mut metadata = DocumentMetadata {
        source_url: meta.original_url.to_string(),
        url: result.final_url.clone(),
        status_code: result.status,
        content_type: result.content_type.clone(),
        proxy_used: result.proxy_used,
        num_pages: result.pdf_meta.as_ref().map(|m| m.pages),
        title: result.pdf_meta.as_ref().and_then(|m| m.title.clone()),
        gatekeeper: None,
    };

    let base_url = Url::parse(&result.final_url).unwrap_or_else(|_| meta.canonical_url.clone());
    // Document and pass-through PDF engines hand back base64 bytes in
    // `html`, not markup. Only Fetch/Browser and text-extracted PDF carry
    // transformable content.
    let is_transformable = matches!(engine, Engine::Fetch | Engine::Browser)
        || (engine == Engine::Pdf && result.pdf_meta.is_some());

    if is_transformable {
        let extracted = riptide_html::extract_metadata(&result.html);
        if metadata.title.is_none() {
            metadata.title = extracted.title.clone();
        }

        let gatekeeper_evidence = result
            .gatekeeper_evidence
            .clone()
            .unwrap_or_else(|| compute_gatekeeper_evidence(state, &result, &metadata, &extracted));
        metadata.gatekeeper = Some(gatekeeper_evidence);

        if options.wants_markdown_derived_html() && document.markdown.is_none() {
            let markdown = render_markdown(&result.html, &base_url, options.only_main_content);
            let markdown = if markdown.trim().is_empty() && options.only_main_content {
                render_markdown(&result.html, &base_url, false)
            } else {
                markdown
            };
            document.markdown = Some(markdown);
        }

        if options.wants(Format::Html) {
            let cleanup_options = riptide_html::CleanupOptions {
                include_tags: &options.include_tags,
                exclude_tags: &options.exclude_tags,
                remove_base64_images: options.remove_base64_images,
            };
            document.html = Some(riptide_html::clean(&result.html, &base_url, &cleanup_options));
        }

        if options.wants(Format::Links) {
            document.links = Some(riptide_html::links::extract(&result.html, &base_url));
        }

        if options.wants(Format::Images) {
            document.images = Some(riptide_html::images::extract(
                &result.html,
                &base_url,
                options.remove_base64_images,
            ));
        }
    }

    if options.wants(Format::RawHtml) {
        document.raw_html = Some(result.html);
    }

    document.metadata = metadata;
    document
}

fn compute_gatekeeper_evidence(
    state: &AppState,
    result: &EngineResult,
    metadata: &DocumentMetadata,
    extracted: &riptide_html::ExtractedMetadata,
) -> GatekeeperEvidence {
    let host = Url::parse(&result.final_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    let rule_set = riptide_gatekeeper::rule_set(state.config.gatekeeper_rules_path.as_deref());
    let thresholds = rule_set.thresholds_for_host(&host, state.gatekeeper_thresholds);
    classify(&ClassifyInput {
        html: &result.html,
        title: extracted.title.as_deref().or(metadata.title.as_deref()),
        status: result.status,
        final_url: &result.final_url,
        host: &host,
        rule_set,
        thresholds,
    })
}

impl From<TransportError> for ScrapeError {
    fn from(err: TransportError) -> Self {
        ScrapeError::Transport(err)
    }
}

impl From<EngineDomainError> for ScrapeError {
    fn from(err: EngineDomainError) -> Self {
        ScrapeError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_types::{FeatureSet, Meta as MetaType, NeverCancelled, ScrapeOptions};
    use std::sync::Arc;

    fn meta_with_flags(url: &str, flags: FeatureSet) -> MetaType {
        let mut meta = MetaType::new(
            Url::parse(url).unwrap(),
            ScrapeOptions::default(),
            Arc::new(NeverCancelled),
        );
        meta.add_feature_flags(flags);
        meta
    }

    #[test]
    fn document_flag_prepends_document_engine() {
        let mut flags = FeatureSet::new();
        flags.insert(FeatureFlag::Document);
        let meta = meta_with_flags("https://example.com/report.docx", flags);
        let order = build_engine_order(&meta, true);
        assert_eq!(order, vec![Engine::Document, Engine::Browser, Engine::Fetch]);
    }

    #[test]
    fn pdf_flag_prepends_pdf_engine_without_browser() {
        let mut flags = FeatureSet::new();
        flags.insert(FeatureFlag::Pdf);
        let meta = meta_with_flags("https://example.com/paper.pdf", flags);
        let order = build_engine_order(&meta, false);
        assert_eq!(order, vec![Engine::Pdf, Engine::Fetch]);
    }

    #[test]
    fn plain_html_url_with_no_browser_is_fetch_only() {
        let meta = meta_with_flags("https://example.com/article", FeatureSet::new());
        let order = build_engine_order(&meta, false);
        assert_eq!(order, vec![Engine::Fetch]);
    }

    #[test]
    fn non_2xx_status_is_accepted_even_with_empty_markdown() {
        let meta = meta_with_flags("https://example.com/missing", FeatureSet::new());
        let result = EngineResult {
            final_url: "https://example.com/missing".to_string(),
            html: String::new(),
            status: 404,
            content_type: None,
            proxy_used: None,
            pdf_meta: None,
            render_status: None,
            gatekeeper_evidence: None,
        };
        assert!(is_acceptable(&meta, &result));
    }

    #[test]
    fn empty_body_on_success_status_is_rejected() {
        let meta = meta_with_flags("https://example.com/empty", FeatureSet::new());
        let result = EngineResult {
            final_url: "https://example.com/empty".to_string(),
            html: "<html><body></body></html>".to_string(),
            status: 200,
            content_type: None,
            proxy_used: None,
            pdf_meta: None,
            render_status: None,
            gatekeeper_evidence: None,
        };
        assert!(!is_acceptable(&meta, &result));
    }
}
