//! Metadata extraction transformer (C9): title, description, Open Graph
//! fields, author, published date, keywords and document language.

use scraper::{Html, Selector};

#[derive(Debug, Default, Clone)]
pub struct ExtractedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub keywords: Vec<String>,
    pub language: Option<String>,
}

pub fn extract(html: &str) -> ExtractedMetadata {
    let document = Html::parse_document(html);

    ExtractedMetadata {
        title: select_text(&document, "title"),
        description: select_meta_content(&document, "description"),
        og_title: select_meta_property(&document, "og:title"),
        og_description: select_meta_property(&document, "og:description"),
        og_image: select_meta_property(&document, "og:image"),
        author: select_meta_content(&document, "author"),
        published_date: published_date(&document),
        keywords: select_meta_content(&document, "keywords")
            .map(|raw| {
                raw.split(',')
                    .map(|keyword| keyword.trim().to_string())
                    .filter(|keyword| !keyword.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        language: document_language(&document),
    }
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn select_meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn select_meta_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn published_date(document: &Html) -> Option<String> {
    for property in [
        "article:published_time",
        "og:published_time",
        "article:modified_time",
    ] {
        if let Some(value) = select_meta_property(document, property) {
            return Some(value);
        }
    }
    select_meta_content(document, "date")
}

fn document_language(document: &Html) -> Option<String> {
    let selector = Selector::parse("html").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_description() {
        let html = r#"<html><head><title>My Page</title>
            <meta name="description" content="a summary"></head><body></body></html>"#;
        let metadata = extract(html);
        assert_eq!(metadata.title.as_deref(), Some("My Page"));
        assert_eq!(metadata.description.as_deref(), Some("a summary"));
    }

    #[test]
    fn extracts_open_graph_fields() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG Title">
            <meta property="og:description" content="OG Desc">
            <meta property="og:image" content="https://example.com/og.png">
            </head><body></body></html>"#;
        let metadata = extract(html);
        assert_eq!(metadata.og_title.as_deref(), Some("OG Title"));
        assert_eq!(metadata.og_description.as_deref(), Some("OG Desc"));
        assert_eq!(metadata.og_image.as_deref(), Some("https://example.com/og.png"));
    }

    #[test]
    fn splits_keywords_and_reads_language() {
        let html = r#"<html lang="en-US"><head>
            <meta name="keywords" content="rust, http, crawler"></head><body></body></html>"#;
        let metadata = extract(html);
        assert_eq!(metadata.keywords, vec!["rust", "http", "crawler"]);
        assert_eq!(metadata.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn falls_back_through_published_date_sources() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="2024-01-01T00:00:00Z">
            </head><body></body></html>"#;
        let metadata = extract(html);
        assert_eq!(metadata.published_date.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn missing_fields_are_none() {
        let html = "<html><head></head><body></body></html>";
        let metadata = extract(html);
        assert!(metadata.title.is_none());
        assert!(metadata.description.is_none());
        assert!(metadata.keywords.is_empty());
    }
}
