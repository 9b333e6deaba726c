//! HTML cleanup transformer (spec.md §4.8, C9): strips script/style/
//! noscript, honors `includeTags`/`excludeTags`, strips base64 image data
//! URIs, and rewrites relative URLs against the final URL.
//!
//! Rather than mutate the parse tree (`scraper` has no serializer for
//! that), this selects the subtrees to drop and cuts their exact
//! serialized HTML out of the source string.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

fn attr_url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"(?i)\b(href|src)\s*=\s*"([^"]*)""#).unwrap())
}

fn data_image_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(r#"(?is)<img\b[^>]*\bsrc\s*=\s*"data:[^"]*"[^>]*/?>"#).unwrap())
}

pub struct CleanupOptions<'a> {
    pub include_tags: &'a [String],
    pub exclude_tags: &'a [String],
    pub remove_base64_images: bool,
}

pub fn clean(html: &str, base_url: &Url, options: &CleanupOptions) -> String {
    let mut content = strip_selectors(html, &["script", "style", "noscript"]);

    if !options.exclude_tags.is_empty() {
        let selectors: Vec<&str> = options.exclude_tags.iter().map(String::as_str).collect();
        content = strip_selectors(&content, &selectors);
    }

    if !options.include_tags.is_empty() {
        content = restrict_to(&content, options.include_tags);
    }

    if options.remove_base64_images {
        content = data_image_regex().replace_all(&content, "").into_owned();
    }

    rewrite_relative_urls(&content, base_url)
}

/// Removes every element matched by any of `selectors`, cutting its exact
/// serialized outer HTML from `html`. Selectors that fail to parse (a
/// caller-supplied `excludeTags` entry that isn't valid CSS) are skipped
/// rather than failing the whole cleanup.
fn strip_selectors(html: &str, selectors: &[&str]) -> String {
    let document = Html::parse_document(html);
    let mut removals: Vec<String> = Vec::new();

    for raw_selector in selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        for element in document.select(&selector) {
            removals.push(element.html());
        }
    }

    // Longest first: a nested match's HTML is a substring of its parent's,
    // so removing the parent first avoids leaving an orphaned fragment
    // that a later, shorter removal can no longer find.
    removals.sort_by_key(|html| std::cmp::Reverse(html.len()));

    let mut content = html.to_string();
    for removal in removals {
        if let Some(pos) = content.find(&removal) {
            content.replace_range(pos..pos + removal.len(), "");
        }
    }
    content
}

fn restrict_to(html: &str, include_selectors: &[String]) -> String {
    let document = Html::parse_document(html);
    let mut matched = String::new();
    let mut found_any = false;

    for raw_selector in include_selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        for element in document.select(&selector) {
            found_any = true;
            matched.push_str(&element.html());
            matched.push('\n');
        }
    }

    if found_any {
        matched
    } else {
        html.to_string()
    }
}

fn rewrite_relative_urls(html: &str, base_url: &Url) -> String {
    attr_url_regex()
        .replace_all(html, |captures: &regex::Captures| {
            let attr = &captures[1];
            let value = &captures[2];
            if is_already_absolute(value) {
                return captures[0].to_string();
            }
            match base_url.join(value) {
                Ok(resolved) => format!(r#"{attr}="{resolved}""#),
                Err(_) => captures[0].to_string(),
            }
        })
        .into_owned()
}

fn is_already_absolute(value: &str) -> bool {
    value.is_empty()
        || value.starts_with('#')
        || value.starts_with("data:")
        || value.starts_with("mailto:")
        || value.starts_with("tel:")
        || value.starts_with("javascript:")
        || Url::parse(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/articles/").unwrap()
    }

    #[test]
    fn strips_script_style_and_noscript() {
        let html = "<html><body><script>x()</script><style>.a{}</style><noscript>no js</noscript><p>text</p></body></html>";
        let opts = CleanupOptions {
            include_tags: &[],
            exclude_tags: &[],
            remove_base64_images: false,
        };
        let cleaned = clean(html, &base(), &opts);
        assert!(!cleaned.contains("x()"));
        assert!(!cleaned.contains(".a{}"));
        assert!(!cleaned.contains("no js"));
        assert!(cleaned.contains("text"));
    }

    #[test]
    fn honors_exclude_tags_selector() {
        let html = "<html><body><nav>menu</nav><p>keep me</p></body></html>";
        let opts = CleanupOptions {
            include_tags: &[],
            exclude_tags: &["nav".to_string()],
            remove_base64_images: false,
        };
        let cleaned = clean(html, &base(), &opts);
        assert!(!cleaned.contains("menu"));
        assert!(cleaned.contains("keep me"));
    }

    #[test]
    fn honors_include_tags_selector() {
        let html = "<html><body><nav>menu</nav><article>keep me</article></body></html>";
        let opts = CleanupOptions {
            include_tags: &["article".to_string()],
            exclude_tags: &[],
            remove_base64_images: false,
        };
        let cleaned = clean(html, &base(), &opts);
        assert!(!cleaned.contains("menu"));
        assert!(cleaned.contains("keep me"));
    }

    #[test]
    fn strips_base64_image_data_uris() {
        let html = r#"<p><img src="data:image/png;base64,AAAA"><img src="/real.png"></p>"#;
        let opts = CleanupOptions {
            include_tags: &[],
            exclude_tags: &[],
            remove_base64_images: true,
        };
        let cleaned = clean(html, &base(), &opts);
        assert!(!cleaned.contains("data:image"));
        assert!(cleaned.contains("/real.png"));
    }

    #[test]
    fn rewrites_relative_urls_against_base() {
        let html = r#"<a href="../about">About</a><img src="photo.jpg">"#;
        let opts = CleanupOptions {
            include_tags: &[],
            exclude_tags: &[],
            remove_base64_images: false,
        };
        let cleaned = clean(html, &base(), &opts);
        assert!(cleaned.contains(r#"href="https://example.com/about""#));
        assert!(cleaned.contains(r#"src="https://example.com/articles/photo.jpg""#));
    }

    #[test]
    fn leaves_already_absolute_urls_untouched() {
        let html = r#"<a href="https://other.com/x">link</a>"#;
        let opts = CleanupOptions {
            include_tags: &[],
            exclude_tags: &[],
            remove_base64_images: false,
        };
        let cleaned = clean(html, &base(), &opts);
        assert!(cleaned.contains(r#"href="https://other.com/x""#));
    }
}
