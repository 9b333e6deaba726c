//! Charset handling for the Fetch engine (spec.md §4.2 "Charset handling").
//!
//! Decodes as UTF-8 first, then scans the first page of bytes for a
//! `<meta charset=...>` (or `<meta http-equiv="Content-Type" ...
//! charset=...>`) hint. If a different, recognized charset is declared,
//! re-decodes the full body with it; unknown or unrecognized labels fall
//! back to the UTF-8 decode already in hand.

use encoding_rs::Encoding;

/// Only the first page of bytes is scanned for a meta-charset hint — real
/// documents declare it near the top of `<head>`, and scanning further
/// risks matching content that merely mentions the word "charset".
const SNIFF_WINDOW: usize = 4096;

pub fn decode_body(bytes: &[u8]) -> String {
    let utf8_guess = String::from_utf8_lossy(bytes).into_owned();

    match sniff_meta_charset(bytes) {
        Some(label) => match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding != encoding_rs::UTF_8 => {
                let (decoded, _, had_errors) = encoding.decode(bytes);
                if had_errors {
                    utf8_guess
                } else {
                    decoded.into_owned()
                }
            }
            _ => utf8_guess,
        },
        None => utf8_guess,
    }
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window).to_lowercase();

    if let Some(start) = head.find("charset=") {
        let rest = &head[start + "charset=".len()..];
        let value: String = rest
            .trim_start_matches(['"', '\''])
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if !value.is_empty() {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_utf8_body() {
        let body = "<html><body>héllo</body></html>".as_bytes();
        assert_eq!(decode_body(body), "<html><body>héllo</body></html>");
    }

    #[test]
    fn sniffs_meta_charset_declaration() {
        let html = r#"<html><head><meta charset="windows-1252"></head></html>"#;
        assert_eq!(
            sniff_meta_charset(html.as_bytes()),
            Some("windows-1252".to_string())
        );
    }

    #[test]
    fn redecodes_with_declared_latin1_charset() {
        // 0xE9 is "é" in windows-1252/latin1 but invalid as a lone UTF-8 byte.
        let mut body = br#"<meta charset="windows-1252">caf"#.to_vec();
        body.push(0xE9);
        let decoded = decode_body(&body);
        assert!(decoded.contains('é'));
    }

    #[test]
    fn unknown_charset_label_falls_back_to_utf8() {
        let html = r#"<meta charset="bogus-charset-xyz">hello"#;
        let decoded = decode_body(html.as_bytes());
        assert_eq!(decoded, html);
    }
}
