//! Engine: Browser (spec.md §4.3, C3) — posts a render request to the
//! headless-rendering microservice and applies the Browser engine's
//! specialized 401/403/Set-Cookie retry policy (spec.md §4.7).
//!
//! A thin `reqwest::Client` wrapper with a hard request timeout around
//! the rendering microservice's own RPC protocol.

use riptide_reliability::with_cancellation;
use riptide_security::{dispatcher::normalize_transport_error, DispatcherKey, SecureDispatcher};
use riptide_types::{
    EngineOutcome, EngineResult, GatekeeperEvidence, Meta, ProxyUsed, RenderStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retried up to this many additional times when the microservice reports
/// a challenge (401/403, or a `Set-Cookie` on the response) — established
/// cookies from the first hit often unlock the second.
const MAX_CHALLENGE_RETRIES: u32 = 2;

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    wait_after_load: Option<u64>,
    timeout: u64,
    headers: &'a HashMap<String, String>,
    skip_tls_verification: bool,
    use_stealth: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum WireRenderStatus {
    Loaded,
    Timeout,
    NavError,
}

impl From<WireRenderStatus> for RenderStatus {
    fn from(status: WireRenderStatus) -> Self {
        match status {
            WireRenderStatus::Loaded => RenderStatus::Loaded,
            WireRenderStatus::Timeout => RenderStatus::Timeout,
            WireRenderStatus::NavError => RenderStatus::NavError,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    content: String,
    #[serde(rename = "pageStatusCode")]
    page_status_code: u16,
    #[serde(rename = "contentType")]
    content_type: Option<String>,
    render_status: Option<WireRenderStatus>,
    // `content_status` duplicates `evidence.content_status` when evidence is
    // present; the gatekeeper evidence is the richer of the two, so only it
    // is carried forward.
    evidence: Option<GatekeeperEvidence>,
}

pub struct BrowserEngine {
    dispatcher: Arc<SecureDispatcher>,
    render_service_url: String,
    request_timeout: Duration,
}

impl BrowserEngine {
    pub fn new(dispatcher: Arc<SecureDispatcher>, render_service_url: String) -> Self {
        Self {
            dispatcher,
            render_service_url,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub async fn render(
        &self,
        meta: &Meta,
        headers: &HashMap<String, String>,
        use_stealth: bool,
    ) -> EngineOutcome {
        let mut attempts_left = 1 + MAX_CHALLENGE_RETRIES;
        let mut last = None;

        while attempts_left > 0 {
            attempts_left -= 1;
            let outcome = self.render_once(meta, headers, use_stealth).await;
            if !is_challenge(&outcome) || attempts_left == 0 {
                return outcome;
            }
            debug!(
                url = %meta.canonical_url,
                attempts_left,
                "browser engine hit a challenge response, retrying with established cookies"
            );
            last = Some(outcome);
        }

        last.expect("loop runs at least once")
    }

    async fn render_once(
        &self,
        meta: &Meta,
        headers: &HashMap<String, String>,
        use_stealth: bool,
    ) -> EngineOutcome {
        let endpoint = format!("{}/render", self.render_service_url.trim_end_matches('/'));
        let Ok(endpoint_url) = reqwest::Url::parse(&endpoint) else {
            return EngineOutcome::Transport(riptide_types::TransportError::Network(format!(
                "invalid render service URL: {endpoint}"
            )));
        };
        if let Err(err) = self.dispatcher.guard_host(&endpoint_url) {
            return EngineOutcome::Transport(err);
        }

        let skip_tls = meta.options.effective_skip_tls_verification();
        let client = self.dispatcher.client(DispatcherKey::new(skip_tls, true));

        let request = RenderRequest {
            url: meta.canonical_url.as_str(),
            wait_after_load: meta.options.wait_for_ms,
            timeout: meta.options.timeout_ms.unwrap_or(30_000),
            headers,
            skip_tls_verification: skip_tls,
            use_stealth,
        };

        let send = tokio::time::timeout(
            self.request_timeout,
            client.post(&endpoint).json(&request).send(),
        );
        let response = match with_cancellation(&meta.cancellation, send).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(err))) => return EngineOutcome::Transport(normalize_transport_error(&err)),
            Ok(Err(_)) => {
                return EngineOutcome::Transport(riptide_types::TransportError::Network(
                    "render service request timed out".to_string(),
                ))
            }
            Err(kind) => return EngineOutcome::Cancelled(kind),
        };

        let status = response.status();
        let has_set_cookie = response.headers().contains_key(reqwest::header::SET_COOKIE);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return EngineOutcome::Unsuccessful(format!(
                "render service returned {status} (challenge)"
            ));
        }
        if !status.is_success() {
            return EngineOutcome::Unsuccessful(format!("render service returned {status}"));
        }

        let body: RenderResponse = match with_cancellation(&meta.cancellation, response.json()).await
        {
            Ok(Ok(body)) => body,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to parse render service response");
                return EngineOutcome::Unsuccessful(format!(
                    "invalid render service response: {err}"
                ));
            }
            Err(kind) => return EngineOutcome::Cancelled(kind),
        };

        if has_set_cookie {
            info!(url = %meta.canonical_url, "render service set cookies, treating as challenge signal");
            return EngineOutcome::Unsuccessful("render service set cookies".to_string());
        }

        EngineOutcome::Ok(EngineResult {
            final_url: meta.canonical_url.to_string(),
            html: body.content,
            status: body.page_status_code,
            content_type: body.content_type,
            proxy_used: Some(if use_stealth {
                ProxyUsed::Stealth
            } else {
                ProxyUsed::Basic
            }),
            pdf_meta: None,
            render_status: body.render_status.map(Into::into),
            gatekeeper_evidence: body.evidence,
        })
    }
}

fn is_challenge(outcome: &EngineOutcome) -> bool {
    matches!(outcome, EngineOutcome::Unsuccessful(msg) if msg.contains("challenge") || msg.contains("cookies"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_detection_matches_unauthorized_and_cookie_messages() {
        assert!(is_challenge(&EngineOutcome::Unsuccessful(
            "render service returned 401 Unauthorized (challenge)".to_string()
        )));
        assert!(is_challenge(&EngineOutcome::Unsuccessful(
            "render service set cookies".to_string()
        )));
        assert!(!is_challenge(&EngineOutcome::Unsuccessful(
            "render service returned 500 Internal Server Error".to_string()
        )));
    }
}
