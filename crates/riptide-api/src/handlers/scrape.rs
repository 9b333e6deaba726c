//! `POST /scrape` handler.

use crate::dto::ScrapeRequest;
use crate::errors::ApiError;
use crate::pipeline;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use riptide_reliability::AbortTimeoutManager;
use riptide_types::{Meta, NeverCancelled, ScrapeError, ScrapeOutcome};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

/// Failures past validation surface as HTTP 502 with the request id that
/// produced them (spec.md §6: "On failure HTTP 502 with body
/// `{success:false, requestId, error:{code, message}}`"). Validation
/// failures never reach this function — they return `ApiError` (400)
/// straight out of the `?` operators below.
#[instrument(skip(state, request), fields(url = %request.url))]
pub async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Response, ApiError> {
    let url = state.validator.validate_url(&request.url)?;

    let header_pairs: Vec<(String, String)> = request
        .options
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    state.validator.validate_headers(&header_pairs)?;

    if let Some(host) = url.host_str() {
        if state.blocklist.is_blocked(host) {
            return Err(ScrapeError::CrawlDenied(format!("{host} is blocklisted")).into());
        }
    }

    let timeout = request.options.timeout_ms.map(Duration::from_millis);
    let manager = AbortTimeoutManager::new(Arc::new(NeverCancelled), timeout);
    let meta = Meta::new(url, request.options, manager.signal());
    let request_id = meta.request_id;

    match pipeline::run_scrape(&state, meta).await {
        Ok(document) => {
            let outcome = ScrapeOutcome::Success(Box::new(document));
            Ok(Json(outcome).into_response())
        }
        Err(err) => {
            warn!(%request_id, error = %err, code = err.code(), "scrape failed");
            let body = json!({
                "success": false,
                "requestId": request_id,
                "error": { "code": err.code(), "message": err.to_string() },
            });
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
    }
}
