//! Engine: Document (spec.md §4.4, C5) — downloads docx/odt/rtf/xlsx bytes
//! and returns them unparsed; parsing is deferred to the transformer
//! stage, which treats this body as opaque.

use crate::download;
use base64::Engine as _;
use riptide_security::SecureDispatcher;
use riptide_types::{EngineOutcome, EngineResult, Meta, ProxyUsed};
use std::sync::Arc;

pub struct DocumentEngine {
    dispatcher: Arc<SecureDispatcher>,
}

impl DocumentEngine {
    pub fn new(dispatcher: Arc<SecureDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn fetch(&self, meta: &Meta) -> EngineOutcome {
        let downloaded = match download::download(&self.dispatcher, meta).await {
            Ok(downloaded) => downloaded,
            Err(download::DownloadError::Transport(err)) => return EngineOutcome::Transport(err),
            Err(download::DownloadError::Cancelled(kind)) => return EngineOutcome::Cancelled(kind),
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode(&downloaded.bytes);
        EngineOutcome::Ok(EngineResult {
            final_url: downloaded.final_url,
            html: encoded,
            status: downloaded.status,
            content_type: downloaded.content_type,
            proxy_used: Some(ProxyUsed::Basic),
            pdf_meta: None,
            render_status: None,
            gatekeeper_evidence: None,
        })
    }
}
