//! Sitemap Processor (C11, spec.md §4.10): iteratively walks the sitemap
//! graph from a root URL with a global, bounded hit set for cycle
//! protection.
//!
//! XML parsing via the `xml` crate's `EventReader`, tracking the current
//! element path on a stack so `<loc>` inside `<sitemap>` (a recurse
//! instruction) is never confused with `<loc>` inside `<url>` (a process
//! instruction).

use flate2::read::GzDecoder;
use riptide_security::SecureDispatcher;
use riptide_security::dispatcher::normalize_transport_error;
use riptide_security::DispatcherKey;
use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;
use xml::reader::{EventReader, XmlEvent};

/// Upper bound on distinct sitemap URLs visited in one walk (spec.md §4.10:
/// "to be chosen by the implementer; the source uses a fixed bound").
pub const SITEMAP_LIMIT: usize = 50_000;

#[derive(Debug, Clone)]
pub enum SitemapInstruction {
    /// A `<sitemapindex>` entry: another sitemap to walk.
    Recurse(Vec<Url>),
    /// A `<urlset>` entry: a page URL for the caller's link handler.
    Process(Vec<Url>),
}

#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("transport error fetching sitemap: {0}")]
    Transport(#[from] riptide_types::TransportError),
    #[error("sitemap document could not be parsed")]
    Unparsable,
}

pub struct SitemapProcessor {
    dispatcher: Arc<SecureDispatcher>,
    visited: HashSet<String>,
}

impl SitemapProcessor {
    pub fn new(dispatcher: Arc<SecureDispatcher>) -> Self {
        Self {
            dispatcher,
            visited: HashSet::new(),
        }
    }

    /// Walks the sitemap graph from `root`, calling `on_urls` for every
    /// batch of page URLs discovered ("process" instructions). Recurse
    /// instructions are followed depth-first up to `SITEMAP_LIMIT` total
    /// visited sitemaps.
    pub async fn walk(&mut self, root: Url, mut on_urls: impl FnMut(Vec<Url>)) {
        let mut queue = vec![root];

        while let Some(sitemap_url) = queue.pop() {
            if self.visited.len() >= SITEMAP_LIMIT {
                warn!(limit = SITEMAP_LIMIT, "sitemap hit set limit reached, stopping walk");
                break;
            }
            let key = sitemap_url.to_string();
            if !self.visited.insert(key.clone()) {
                debug!(url = %key, "sitemap already visited, skipping");
                continue;
            }

            match self.fetch_and_parse(&sitemap_url).await {
                Ok(instructions) => {
                    for instruction in instructions {
                        match instruction {
                            SitemapInstruction::Recurse(urls) => queue.extend(urls),
                            SitemapInstruction::Process(urls) => on_urls(urls),
                        }
                    }
                }
                Err(err) => {
                    warn!(url = %key, error = %err, "failed to fetch or parse sitemap, skipping");
                }
            }
        }
    }

    async fn fetch_and_parse(&self, url: &Url) -> Result<Vec<SitemapInstruction>, SitemapError> {
        let bytes = self.download(url).await?;

        let text = if url.path().ends_with(".gz") {
            let mut decoder = GzDecoder::new(bytes.as_slice());
            let mut decompressed = String::new();
            if decoder.read_to_string(&mut decompressed).is_err() {
                return Err(SitemapError::Unparsable);
            }
            decompressed
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        parse_sitemap_xml(&text).ok_or(SitemapError::Unparsable)
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, riptide_types::TransportError> {
        self.dispatcher.guard_host(url)?;
        let client = self.dispatcher.client(DispatcherKey::new(false, false));
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| normalize_transport_error(&err))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| normalize_transport_error(&err))?;
        Ok(bytes.to_vec())
    }
}

/// Parses either a `<sitemapindex>` (→ `Recurse`) or a `<urlset>` (→
/// `Process`) document. Returns `None` for a completely unparsable
/// document (spec.md §4.10 step 2: "logged and skipped" by the caller).
fn parse_sitemap_xml(content: &str) -> Option<Vec<SitemapInstruction>> {
    let parser = EventReader::from_str(content);

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut sitemap_locs = Vec::new();
    let mut url_locs = Vec::new();
    let mut any_element = false;

    for event in parser {
        match event {
            Ok(XmlEvent::StartElement { name, .. }) => {
                any_element = true;
                path.push(name.local_name);
                text.clear();
            }
            Ok(XmlEvent::Characters(data)) | Ok(XmlEvent::CData(data)) => {
                text.push_str(&data);
            }
            Ok(XmlEvent::EndElement { .. }) => {
                if path.last().map(String::as_str) == Some("loc") {
                    if let Ok(url) = Url::parse(text.trim()) {
                        match path.get(path.len().saturating_sub(2)).map(String::as_str) {
                            Some("sitemap") => sitemap_locs.push(url),
                            Some("url") => url_locs.push(url),
                            _ => {}
                        }
                    }
                }
                path.pop();
                text.clear();
            }
            Err(_) => return if any_element { Some(Vec::new()) } else { None },
            _ => {}
        }
    }

    if !any_element {
        return None;
    }

    let mut instructions = Vec::new();
    if !sitemap_locs.is_empty() {
        instructions.push(SitemapInstruction::Recurse(sitemap_locs));
    }
    if !url_locs.is_empty() {
        instructions.push(SitemapInstruction::Process(url_locs));
    }
    Some(instructions)
}
