//! Engine: PDF (spec.md §4.4, C4).
//!
//! Text extraction is a hand-rolled content stream walker: rather than
//! wire up `pdfium-render`, it parses `BT`/`ET` text blocks and `Tj`/`TJ`
//! operators directly out of `lopdf` page content streams.

use crate::download::{self, Downloaded};
use base64::Engine as _;
use lopdf::Document as LopdfDocument;
use riptide_security::SecureDispatcher;
use riptide_types::{EngineDomainError, EngineOutcome, EngineResult, Meta, PdfMeta, PdfParsing, ProxyUsed};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Budget consumed per page during text extraction (spec.md §4.4).
const MS_PER_PAGE: u64 = 150;

pub struct PdfEngine {
    dispatcher: Arc<SecureDispatcher>,
}

impl PdfEngine {
    pub fn new(dispatcher: Arc<SecureDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// `remaining_budget` is how much of the overall scrape timeout is left
    /// when this engine is invoked — supplied by the orchestrator, which
    /// tracks it via the Abort/Timeout Manager (C13).
    pub async fn fetch(&self, meta: &Meta, remaining_budget: Duration) -> EngineOutcome {
        let downloaded = match download::download(&self.dispatcher, meta).await {
            Ok(downloaded) => downloaded,
            Err(download::DownloadError::Transport(err)) => return EngineOutcome::Transport(err),
            Err(download::DownloadError::Cancelled(kind)) => return EngineOutcome::Cancelled(kind),
        };

        let parsing = meta
            .options
            .parsers
            .clone()
            .unwrap_or(PdfParsing::PassThrough);

        match parsing {
            PdfParsing::PassThrough => self.pass_through(meta, downloaded),
            PdfParsing::Parse { max_pages } => self.parse(downloaded, max_pages, remaining_budget),
        }
    }

    fn pass_through(&self, meta: &Meta, downloaded: Downloaded) -> EngineOutcome {
        let is_pdf_content_type = downloaded
            .content_type
            .as_deref()
            .map(|ct| ct.starts_with("application/pdf"))
            .unwrap_or(false);
        let pdf_flag_set = meta.feature_flags.contains(&riptide_types::FeatureFlag::Pdf);

        if !is_pdf_content_type && !pdf_flag_set {
            return EngineOutcome::Domain(EngineDomainError::EngineUnsuccessful(
                "response is not a PDF and the pdf feature flag was not set".to_string(),
            ));
        }

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

    fn parse(
        &self,
        downloaded: Downloaded,
        max_pages: Option<u32>,
        remaining_budget: Duration,
    ) -> EngineOutcome {
        // Written to a temp file (rather than parsed from the in-memory
        // buffer directly) so large PDFs don't have to be loaded twice by
        // lopdf's own internal bookkeeping; the file is removed as soon as
        // `temp_file` drops, on every return path below.
        let temp_file = match tempfile::NamedTempFile::new() {
            Ok(file) => file,
            Err(err) => {
                return EngineOutcome::Domain(EngineDomainError::EngineUnsuccessful(format!(
                    "failed to create temp file for PDF parsing: {err}"
                )))
            }
        };
        if let Err(err) = std::fs::write(temp_file.path(), &downloaded.bytes) {
            return EngineOutcome::Domain(EngineDomainError::EngineUnsuccessful(format!(
                "failed to write temp file for PDF parsing: {err}"
            )));
        }

        let document = match LopdfDocument::load(temp_file.path()) {
            Ok(document) => document,
            Err(err) => {
                return EngineOutcome::Domain(EngineDomainError::EngineUnsuccessful(format!(
                    "failed to load PDF: {err}"
                )))
            }
        };

        let pages = document.get_pages();
        let actual_pages = pages.len() as u32;
        let effective_pages = max_pages.map(|max| actual_pages.min(max)).unwrap_or(actual_pages);

        let required_ms = u64::from(effective_pages) * MS_PER_PAGE;
        if Duration::from_millis(required_ms) > remaining_budget {
            return EngineOutcome::Domain(EngineDomainError::PdfInsufficientTime(format!(
                "{effective_pages} pages at {MS_PER_PAGE}ms each exceeds remaining budget of {}ms",
                remaining_budget.as_millis()
            )));
        }

        let title = extract_title(&document);
        let text = extract_text(&document, &pages, effective_pages);
        let escaped = html_escape(&text);

        EngineOutcome::Ok(EngineResult {
            final_url: downloaded.final_url,
            html: escaped,
            status: downloaded.status,
            content_type: downloaded.content_type,
            proxy_used: Some(ProxyUsed::Basic),
            pdf_meta: Some(PdfMeta {
                pages: actual_pages,
                title,
            }),
            render_status: None,
            gatekeeper_evidence: None,
        })
    }
}

fn extract_title(document: &LopdfDocument) -> Option<String> {
    let info_ref = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = document.get_object(info_ref).ok()?.as_dict().ok()?;
    let title = info.get(b"Title").ok()?.as_str().ok()?;
    Some(title.to_string())
}

fn extract_text(
    document: &LopdfDocument,
    pages: &std::collections::BTreeMap<u32, (u32, u16)>,
    effective_pages: u32,
) -> String {
    let mut text = String::new();
    for page_number in 1..=effective_pages {
        let Some(page_id) = pages.get(&page_number).map(|(obj, gen)| (*obj, *gen)) else {
            continue;
        };
        match document.get_page_content(page_id) {
            Ok(content) => {
                text.push_str(&parse_text_operators(&content));
                text.push('\n');
            }
            Err(err) => warn!(page_number, error = %err, "failed to read page content stream"),
        }
    }
    text.trim().to_string()
}

/// Minimal `BT`/`ET`/`Tj` text-block walker. Table and layout extraction
/// are out of scope here (spec.md asks only for page count, title, text).
fn parse_text_operators(content: &[u8]) -> String {
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content.split(|&b| b == b'\n') {
        let line_str = String::from_utf8_lossy(line);
        if line_str.contains("BT") {
            in_text_block = true;
            continue;
        }
        if line_str.contains("ET") {
            in_text_block = false;
            continue;
        }
        if in_text_block && (line_str.contains("Tj") || line_str.contains("TJ")) {
            if let (Some(start), Some(end)) = (line_str.find('('), line_str.rfind(')')) {
                if start < end {
                    text.push_str(&line_str[start + 1..end]);
                    text.push(' ');
                }
            }
        }
    }
    text
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_text_operator() {
        let content = b"BT\n(Hello World) Tj\nET\n";
        assert_eq!(parse_text_operators(content).trim(), "Hello World");
    }

    #[test]
    fn ignores_operators_outside_text_block() {
        let content = b"(not text) Tj\nBT\n(inside) Tj\nET\n";
        assert_eq!(parse_text_operators(content).trim(), "inside");
    }

    #[test]
    fn html_escape_handles_entities() {
        assert_eq!(html_escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }
}
