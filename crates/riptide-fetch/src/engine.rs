//! Engine: Fetch (spec.md §4.2, C2) — a single HTTP request with redirects
//! followed, conditional-GET caching, charset recovery and a handoff to
//! the Specialty Sniffer.

use crate::cache::{CachedValidators, ConditionalGetCache};
use crate::charset::decode_body;
use crate::sniffer;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use riptide_reliability::with_cancellation;
use riptide_security::{dispatcher::normalize_transport_error, DispatcherKey, SecureDispatcher};
use riptide_types::{EngineOutcome, EngineResult, Meta, ProxyUsed};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct FetchEngine {
    dispatcher: Arc<SecureDispatcher>,
    cache: ConditionalGetCache,
}

impl FetchEngine {
    pub fn new(dispatcher: Arc<SecureDispatcher>) -> Self {
        Self {
            dispatcher,
            cache: ConditionalGetCache::new(),
        }
    }

    #[instrument(skip(self, meta, headers), fields(url = %meta.canonical_url))]
    pub async fn fetch(&self, meta: &Meta, headers: &HashMap<String, String>) -> EngineOutcome {
        let url = meta.canonical_url.clone();
        let skip_tls = meta.options.effective_skip_tls_verification();

        if let Err(err) = self.dispatcher.guard_host(&url) {
            return EngineOutcome::Transport(err);
        }

        let key = DispatcherKey::new(skip_tls, false);
        let client = self.dispatcher.client(key);

        let cached = self.cache.get(url.as_str());
        let mut request = client.get(url.clone());
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                request = request.header(name, value);
            }
        }
        request = attach_conditional_headers(request, cached.as_ref());

        let response = match with_cancellation(&meta.cancellation, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return EngineOutcome::Transport(normalize_transport_error(&err)),
            Err(kind) => return EngineOutcome::Cancelled(kind),
        };

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let content_type = response_headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status == 304 {
            if let Some(cached) = cached {
                debug!(url = %final_url, "304 Not Modified, serving cached body");
                return self.finish(meta, &final_url, cached.status, cached.content_type, cached.body);
            }
        }

        let body = match with_cancellation(&meta.cancellation, response.bytes()).await {
            Ok(Ok(bytes)) => bytes.to_vec(),
            Ok(Err(err)) => return EngineOutcome::Transport(normalize_transport_error(&err)),
            Err(kind) => return EngineOutcome::Cancelled(kind),
        };

        if let Some(ref content_type) = content_type {
            if let Some(flag) = sniffer::sniff(content_type) {
                let mut flags = riptide_types::FeatureSet::new();
                flags.insert(flag);
                return EngineOutcome::Escalate(flags);
            }
        }

        let etag = response_headers
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let last_modified = response_headers
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status == 200 && (etag.is_some() || last_modified.is_some()) {
            self.cache.store(
                url.as_str().to_string(),
                CachedValidators {
                    etag,
                    last_modified,
                    body: body.clone(),
                    status,
                    content_type: content_type.clone(),
                    final_url: final_url.clone(),
                },
            );
        }

        self.finish(meta, &final_url, status, content_type, body)
    }

    fn finish(
        &self,
        meta: &Meta,
        final_url: &str,
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    ) -> EngineOutcome {
        let _ = meta;
        let html = decode_body(&body);
        EngineOutcome::Ok(EngineResult {
            final_url: final_url.to_string(),
            html,
            status,
            content_type,
            proxy_used: Some(ProxyUsed::Basic),
            pdf_meta: None,
            render_status: None,
            gatekeeper_evidence: None,
        })
    }
}

fn attach_conditional_headers(
    mut request: reqwest::RequestBuilder,
    cached: Option<&CachedValidators>,
) -> reqwest::RequestBuilder {
    let Some(cached) = cached else {
        return request;
    };
    let mut headers = HeaderMap::new();
    if let Some(etag) = &cached.etag {
        if let Ok(value) = HeaderValue::from_str(etag) {
            headers.insert(IF_NONE_MATCH, value);
        }
    }
    if let Some(last_modified) = &cached.last_modified {
        if let Ok(value) = HeaderValue::from_str(last_modified) {
            headers.insert(IF_MODIFIED_SINCE, value);
        }
    }
    for (name, value) in headers.iter() {
        request = request.header(name, value);
    }
    request
}
