//! Signal matching (spec.md §4.6): the closed set of facts a rule's
//! signals are checked against.

use crate::rules::Signal;
use riptide_types::QualityRecord;

pub struct ClassifyFacts<'a> {
    pub html: &'a str,
    pub title: Option<&'a str>,
    pub status: u16,
    pub final_url: &'a str,
    pub quality: &'a QualityRecord,
}

/// `Some(label)` naming the signal when it matches (used to build the
/// evidence entry's `matched_signals`), `None` otherwise.
pub fn matches(signal: &Signal, facts: &ClassifyFacts) -> bool {
    match signal {
        Signal::ContainsScript(needle) => facts.html.contains(needle.as_str()),
        Signal::TitleMatches(needle) => facts
            .title
            .map(|title| title.contains(needle.as_str()))
            .unwrap_or(false),
        Signal::BodyTextLenLt(n) => facts.quality.visible_text_chars < *n,
        Signal::StatusIn(codes) => codes.contains(&facts.status),
        Signal::RedirectToLogin(substrings) => substrings
            .iter()
            .any(|needle| facts.final_url.contains(needle.as_str())),
        Signal::HtmlBytesLt(n) => facts.quality.html_bytes < *n,
        Signal::VisibleTextLenLt(n) => facts.quality.visible_text_chars < *n,
        Signal::MainContentLenLt(n) => facts.quality.main_content_chars < *n,
        Signal::HasStructuredData(expected) => facts.quality.has_structured_data == *expected,
    }
}

pub fn label(signal: &Signal) -> String {
    match signal {
        Signal::ContainsScript(_) => "contains_script".to_string(),
        Signal::TitleMatches(_) => "title_matches".to_string(),
        Signal::BodyTextLenLt(_) => "body_text_len_lt".to_string(),
        Signal::StatusIn(_) => "status_in".to_string(),
        Signal::RedirectToLogin(_) => "redirect_to_login".to_string(),
        Signal::HtmlBytesLt(_) => "html_bytes_lt".to_string(),
        Signal::VisibleTextLenLt(_) => "visible_text_len_lt".to_string(),
        Signal::MainContentLenLt(_) => "main_content_len_lt".to_string(),
        Signal::HasStructuredData(_) => "has_structured_data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(quality: QualityRecord) -> ClassifyFacts<'static> {
        ClassifyFacts {
            html: "<html><script>bad</script></html>",
            title: Some("Please sign in"),
            status: 200,
            final_url: "https://example.com/login?next=/",
            quality: Box::leak(Box::new(quality)),
        }
    }

    fn quality() -> QualityRecord {
        QualityRecord {
            html_bytes: 100,
            visible_text_chars: 50,
            main_content_chars: 10,
            has_structured_data: false,
        }
    }

    #[test]
    fn contains_script_matches_substring() {
        assert!(matches(&Signal::ContainsScript("bad".into()), &facts(quality())));
        assert!(!matches(&Signal::ContainsScript("good".into()), &facts(quality())));
    }

    #[test]
    fn redirect_to_login_checks_final_url() {
        assert!(matches(
            &Signal::RedirectToLogin(vec!["/login".into()]),
            &facts(quality())
        ));
    }

    #[test]
    fn body_text_len_lt_compares_visible_text() {
        assert!(matches(&Signal::BodyTextLenLt(100), &facts(quality())));
        assert!(!matches(&Signal::BodyTextLenLt(10), &facts(quality())));
    }
}
