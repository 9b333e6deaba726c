//! Image extraction transformer (C9): distinct absolute `src`s found in
//! `<img>` elements. `data:` URIs are omitted when the caller requested
//! base64 image removal, mirroring `cleanup::clean`'s own handling of the
//! same option.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

pub fn extract(html: &str, base_url: &Url, remove_base64_images: bool) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").expect("static selector");

    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        if src.is_empty() {
            continue;
        }
        if src.starts_with("data:") {
            if remove_base64_images {
                continue;
            }
            if seen.insert(src.to_string()) {
                images.push(src.to_string());
            }
            continue;
        }
        let resolved = match base_url.join(src) {
            Ok(url) => url.to_string(),
            Err(_) => continue,
        };
        if seen.insert(resolved.clone()) {
            images.push(resolved);
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/gallery/").unwrap()
    }

    #[test]
    fn extracts_and_resolves_image_sources() {
        let html = r#"<img src="photo.jpg"><img src="/banner.png">"#;
        let images = extract(html, &base(), false);
        assert_eq!(
            images,
            vec![
                "https://example.com/gallery/photo.jpg".to_string(),
                "https://example.com/banner.png".to_string(),
            ]
        );
    }

    #[test]
    fn omits_data_uris_when_removal_requested() {
        let html = r#"<img src="data:image/png;base64,AAAA"><img src="real.jpg">"#;
        let images = extract(html, &base(), true);
        assert_eq!(images, vec!["https://example.com/gallery/real.jpg".to_string()]);
    }

    #[test]
    fn keeps_data_uris_when_removal_not_requested() {
        let html = r#"<img src="data:image/png;base64,AAAA">"#;
        let images = extract(html, &base(), false);
        assert_eq!(images, vec!["data:image/png;base64,AAAA".to_string()]);
    }
}
