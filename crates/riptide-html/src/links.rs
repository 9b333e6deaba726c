//! Link extraction transformer (C9): distinct, order-preserving absolute
//! `href`s found in `<a>` elements.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

pub fn extract(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").expect("static selector");

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        let resolved = match base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(_) => continue,
        };
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/").unwrap()
    }

    #[test]
    fn extracts_and_resolves_links() {
        let html = r#"<a href="/a">A</a><a href="b">B</a><a href="https://other.com/c">C</a>"#;
        let links = extract(html, &base());
        assert_eq!(
            links,
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/blog/b".to_string(),
                "https://other.com/c".to_string(),
            ]
        );
    }

    #[test]
    fn dedupes_repeated_links_preserving_first_order() {
        let html = r#"<a href="/a">first</a><a href="/a">second</a>"#;
        let links = extract(html, &base());
        assert_eq!(links, vec!["https://example.com/a".to_string()]);
    }

    #[test]
    fn skips_fragment_and_javascript_hrefs() {
        let html = r#"<a href="#top">top</a><a href="javascript:void(0)">void</a>"#;
        let links = extract(html, &base());
        assert!(links.is_empty());
    }
}
