//! Shared byte-download helper for the PDF and Document engines: both
//! acquire the whole body through the Secure Dispatcher before doing
//! anything format-specific.

use riptide_reliability::with_cancellation;
use riptide_security::{dispatcher::normalize_transport_error, DispatcherKey, SecureDispatcher};
use riptide_types::{CancellationKind, Meta, TransportError};
use std::sync::Arc;

pub struct Downloaded {
    pub bytes: Vec<u8>,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

/// Mirrors `TransportError`/cancellation the way `EngineOutcome` does, so
/// the PDF and Document engines can convert it directly.
pub enum DownloadError {
    Transport(TransportError),
    Cancelled(CancellationKind),
}

impl From<TransportError> for DownloadError {
    fn from(err: TransportError) -> Self {
        DownloadError::Transport(err)
    }
}

pub async fn download(dispatcher: &Arc<SecureDispatcher>, meta: &Meta) -> Result<Downloaded, DownloadError> {
    let url = meta.canonical_url.clone();
    dispatcher.guard_host(&url)?;

    let skip_tls = meta.options.effective_skip_tls_verification();
    let client = dispatcher.client(DispatcherKey::new(skip_tls, false));

    let response = match with_cancellation(&meta.cancellation, client.get(url).send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => return Err(normalize_transport_error(&err).into()),
        Err(kind) => return Err(DownloadError::Cancelled(kind)),
    };

    let final_url = response.url().to_string();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = match with_cancellation(&meta.cancellation, response.bytes()).await {
        Ok(Ok(bytes)) => bytes.to_vec(),
        Ok(Err(err)) => return Err(normalize_transport_error(&err).into()),
        Err(kind) => return Err(DownloadError::Cancelled(kind)),
    };

    Ok(Downloaded {
        bytes,
        final_url,
        status,
        content_type,
    })
}
