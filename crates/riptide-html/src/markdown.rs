//! GitHub-flavored Markdown conversion (spec.md §4.8): walks the parsed
//! tree directly rather than flattening it to plain text first, so
//! headings, lists, emphasis and inline links survive the conversion.

use scraper::{ElementRef, Html, Node};
use url::Url;

pub fn convert(html: &str, base_url: &Url) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    for child in document.root_element().children() {
        render_node(child, base_url, &mut out);
    }
    collapse_blank_lines(&out)
}

fn render_node(node: ego_tree::NodeRef<'_, Node>, base_url: &Url, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                render_element(element, base_url, out);
            }
        }
        _ => {}
    }
}

fn render_children(element: ElementRef, base_url: &Url, out: &mut String) {
    for child in element.children() {
        render_node(child, base_url, out);
    }
}

fn inline_text(element: ElementRef, base_url: &Url) -> String {
    let mut buf = String::new();
    render_children(element, base_url, &mut buf);
    buf.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_element(element: ElementRef, base_url: &Url, out: &mut String) {
    let tag = element.value().name();
    match tag {
        "script" | "style" | "noscript" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            out.push_str("\n\n");
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(&inline_text(element, base_url));
            out.push_str("\n\n");
        }
        "p" | "div" | "section" | "article" | "header" | "footer" => {
            out.push_str("\n\n");
            render_children(element, base_url, out);
            out.push_str("\n\n");
        }
        "br" => out.push_str("  \n"),
        "hr" => out.push_str("\n\n---\n\n"),
        "strong" | "b" => {
            out.push_str("**");
            out.push_str(&inline_text(element, base_url));
            out.push_str("**");
        }
        "em" | "i" => {
            out.push('_');
            out.push_str(&inline_text(element, base_url));
            out.push('_');
        }
        "code" => {
            out.push('`');
            out.push_str(&inline_text(element, base_url));
            out.push('`');
        }
        "pre" => {
            out.push_str("\n\n```\n");
            out.push_str(&inline_text(element, base_url));
            out.push_str("\n```\n\n");
        }
        "a" => {
            let text = inline_text(element, base_url);
            let href = element
                .value()
                .attr("href")
                .map(|href| resolve(href, base_url))
                .unwrap_or_default();
            if href.is_empty() {
                out.push_str(&text);
            } else {
                out.push_str(&format!("[{}]({})", if text.is_empty() { &href } else { &text }, href));
            }
        }
        "img" => {
            let alt = element.value().attr("alt").unwrap_or_default();
            let src = element
                .value()
                .attr("src")
                .map(|src| resolve(src, base_url))
                .unwrap_or_default();
            out.push_str(&format!("![{alt}]({src})"));
        }
        "ul" => {
            out.push('\n');
            for item in element.children().filter_map(ElementRef::wrap) {
                if item.value().name() == "li" {
                    out.push_str("- ");
                    out.push_str(&inline_text(item, base_url));
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        "ol" => {
            out.push('\n');
            for (index, item) in element.children().filter_map(ElementRef::wrap).enumerate() {
                if item.value().name() == "li" {
                    out.push_str(&format!("{}. ", index + 1));
                    out.push_str(&inline_text(item, base_url));
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        "blockquote" => {
            out.push_str("\n> ");
            out.push_str(&inline_text(element, base_url));
            out.push_str("\n\n");
        }
        _ => render_children(element, base_url, out),
    }
}

fn resolve(value: &str, base_url: &Url) -> String {
    if value.starts_with("data:") || value.starts_with('#') {
        return value.to_string();
    }
    base_url
        .join(value)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut collapsed = String::new();
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        collapsed.push_str(line.trim_end());
        collapsed.push('\n');
    }
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    #[test]
    fn converts_heading_and_paragraph() {
        let html = "<h1>Title</h1><p>Some text</p>";
        let md = convert(html, &base());
        assert!(md.contains("# Title"));
        assert!(md.contains("Some text"));
    }

    #[test]
    fn converts_link_with_relative_href_resolved() {
        let html = r#"<a href="guide">Guide</a>"#;
        let md = convert(html, &base());
        assert_eq!(md.trim(), "[Guide](https://example.com/docs/guide)");
    }

    #[test]
    fn converts_unordered_list() {
        let html = "<ul><li>one</li><li>two</li></ul>";
        let md = convert(html, &base());
        assert!(md.contains("- one"));
        assert!(md.contains("- two"));
    }

    #[test]
    fn converts_emphasis_and_strong() {
        let html = "<p><strong>bold</strong> and <em>italic</em></p>";
        let md = convert(html, &base());
        assert!(md.contains("**bold**"));
        assert!(md.contains("_italic_"));
    }
}
