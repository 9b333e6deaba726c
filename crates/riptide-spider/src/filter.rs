//! The crawl frontier's link filter (`filterLinks`, spec.md §4.11),
//! applied to every in-page link and every sitemap-discovered URL before
//! it is allowed into the frontier.

use regex::Regex;
use riptide_security::DomainBlocklist;
use riptide_types::feature::{detect_from_url, FeatureFlag};
use std::collections::HashSet;
use url::Url;

const NON_HTML_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".bmp", ".ico", ".tiff", ".mp4", ".mp3",
    ".wav", ".avi", ".mov", ".mkv", ".zip", ".tar", ".gz", ".rar", ".7z", ".css", ".js", ".woff",
    ".woff2", ".ttf", ".eot",
];

pub struct FilterPolicy<'a> {
    pub initial_url: &'a Url,
    pub includes: &'a [Regex],
    pub excludes: &'a [Regex],
    pub regex_on_full_url: bool,
    pub allow_subdomains: bool,
    pub allow_external_content_links: bool,
    pub allow_backward_crawling: bool,
    pub blocklist: &'a DomainBlocklist,
}

/// Applies the policy in the documented order, short-circuiting on the
/// first rejecting check. Returns the parsed, normalized URL on
/// admission so the caller doesn't re-parse it.
pub fn filter_link(link: &str, discovered: &HashSet<String>, policy: &FilterPolicy) -> Option<Url> {
    let url = Url::parse(link).ok()?;

    let match_target = if policy.regex_on_full_url {
        url.as_str().to_string()
    } else {
        let mut stripped = url.clone();
        stripped.set_query(None);
        stripped.set_fragment(None);
        stripped.as_str().to_string()
    };

    if policy.excludes.iter().any(|re| re.is_match(&match_target)) {
        return None;
    }
    if !policy.includes.is_empty() && !policy.includes.iter().any(|re| re.is_match(&match_target)) {
        return None;
    }

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    let host = url.host_str()?;
    let initial_host = policy.initial_url.host_str()?;
    let same_host = host.eq_ignore_ascii_case(initial_host);

    if !policy.allow_subdomains && !same_host {
        return None;
    }

    if policy.blocklist.is_blocked(host) {
        return None;
    }

    let content_bearing = is_content_bearing(&url);

    if !policy.allow_external_content_links && !same_host && !content_bearing {
        return None;
    }

    if !policy.allow_backward_crawling {
        let prefix = path_prefix(policy.initial_url.path());
        if !url.path().starts_with(&prefix) {
            return None;
        }
    }

    if discovered.contains(url.as_str()) {
        return None;
    }

    if is_non_html_file(url.path()) && !content_bearing {
        return None;
    }

    Some(url)
}

/// A PDF or office-document target: crawlable even across hosts/extension
/// filters because it feeds the PDF/Document engines rather than the HTML
/// link graph.
fn is_content_bearing(url: &Url) -> bool {
    let flags = detect_from_url(url);
    flags.contains(&FeatureFlag::Pdf) || flags.contains(&FeatureFlag::Document)
}

fn is_non_html_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    NON_HTML_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// The "directory" prefix a backward-crawl-disallowed link must stay
/// under: everything up to and including the last `/`.
fn path_prefix(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..=pos].to_string(),
        None => "/".to_string(),
    }
}
