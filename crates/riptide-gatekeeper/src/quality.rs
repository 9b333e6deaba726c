//! Quality-record computation (spec.md §4.6 step 1): the facts every rule
//! and threshold is evaluated against.

use riptide_types::QualityRecord;
use scraper::{Html, Selector};

pub fn compute(html: &str) -> QualityRecord {
    let document = Html::parse_document(html);
    let visible_text_chars = visible_text(&document).chars().count();
    let main_content_chars = main_content_text(&document)
        .map(|text| text.chars().count())
        .unwrap_or(visible_text_chars);

    QualityRecord {
        html_bytes: html.len(),
        visible_text_chars,
        main_content_chars,
        has_structured_data: has_json_ld(&document),
    }
}

/// Visible text: script/style/noscript removed, tags stripped, whitespace
/// collapsed.
fn visible_text(document: &Html) -> String {
    let skip: Selector = Selector::parse("script, style, noscript").unwrap();
    let skip_nodes: std::collections::HashSet<_> = document
        .select(&skip)
        .flat_map(|el| el.descendants().map(|n| n.id()))
        .chain(document.select(&skip).map(|el| el.id()))
        .collect();

    let mut text = String::new();
    for node in document.root_element().descendants() {
        if skip_nodes.contains(&node.id()) {
            continue;
        }
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
            text.push(' ');
        }
    }
    collapse_whitespace(&text)
}

/// Same cleaning, restricted to `main`/`article` elements; `None` when
/// neither is present (caller falls back to full visible text).
fn main_content_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("main, article").unwrap();
    let mut combined = String::new();
    let mut found = false;
    for element in document.select(&selector) {
        found = true;
        combined.push_str(&element.text().collect::<Vec<_>>().join(" "));
        combined.push(' ');
    }
    found.then(|| collapse_whitespace(&combined))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_json_ld(document: &Html) -> bool {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    document.select(&selector).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_from_visible_text() {
        let html = "<html><body><script>var x = 1;</script><style>.a{}</style><p>hello world</p></body></html>";
        let quality = compute(html);
        assert!(quality.visible_text_chars > 0);
        assert!(!visible_text(&Html::parse_document(html)).contains("var x"));
    }

    #[test]
    fn main_content_falls_back_to_full_text_without_main_or_article() {
        let html = "<html><body><p>just a paragraph</p></body></html>";
        let quality = compute(html);
        assert_eq!(quality.main_content_chars, quality.visible_text_chars);
    }

    #[test]
    fn main_content_restricted_when_main_element_present() {
        let html = "<html><body><nav>ignore this long navigation text here</nav><main>short</main></body></html>";
        let quality = compute(html);
        assert!(quality.main_content_chars < quality.visible_text_chars);
    }

    #[test]
    fn detects_json_ld_structured_data() {
        let html = r#"<html><head><script type="application/ld+json">{}</script></head></html>"#;
        assert!(compute(html).has_structured_data);
        assert!(!compute("<html></html>").has_structured_data);
    }
}
