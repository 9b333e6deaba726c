//! URL/header/content-type validation ahead of dispatch (spec.md §4.1
//! "Input validation").
//!
//! A config struct plus a handful of independent `validate_*` checks, each
//! returning `ScrapeError::Validation` so callers can propagate it straight
//! into the public error taxonomy.

use crate::ssrf;
use riptide_types::ScrapeError;
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

const MAX_URL_LENGTH: usize = 2048;
const MAX_HEADER_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_url_length: usize,
    pub max_header_size: usize,
    pub allowed_domains: Option<HashSet<String>>,
    pub block_private_ips: bool,
    pub max_content_size: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_url_length: MAX_URL_LENGTH,
            max_header_size: MAX_HEADER_SIZE,
            allowed_domains: None,
            block_private_ips: true,
            max_content_size: 20 * 1024 * 1024,
        }
    }
}

/// URL, header and content-size checks applied before a scrape is
/// dispatched. Content-type allowlisting is intentionally not implemented
/// here: spec.md leaves the acceptable-content-type set to the engines
/// themselves (office-document/PDF sniffing escalates rather than rejects).
pub struct InputValidator {
    config: ValidationConfig,
}

impl InputValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(ValidationConfig::default())
    }

    pub fn validate_url(&self, url_str: &str) -> Result<Url, ScrapeError> {
        if url_str.len() > self.config.max_url_length {
            warn!(url_length = url_str.len(), "URL too long");
            return Err(ScrapeError::Validation(format!(
                "URL length {} exceeds maximum {}",
                url_str.len(),
                self.config.max_url_length
            )));
        }

        let url = Url::parse(url_str)
            .map_err(|e| ScrapeError::Validation(format!("invalid URL: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                warn!(scheme, "unsupported URL scheme");
                return Err(ScrapeError::Validation(format!(
                    "unsupported URL scheme: {scheme}"
                )));
            }
        }

        if let Some(ref allowed) = self.config.allowed_domains {
            if let Some(host) = url.host_str() {
                if !allowed.contains(host) {
                    warn!(host, "host not in allowed domains list");
                    return Err(ScrapeError::Validation(format!(
                        "host {host} not in allowed domains"
                    )));
                }
            }
        }

        if self.config.block_private_ips {
            if let Some(host) = url.host_str() {
                if host.eq_ignore_ascii_case("localhost") || ssrf::host_is_literal_private_ip(host)
                {
                    warn!(host, "private or local address blocked");
                    return Err(ScrapeError::Validation(format!(
                        "private or local addresses are not allowed: {host}"
                    )));
                }
            }
        }

        debug!(url = url_str, "URL validation passed");
        Ok(url)
    }

    pub fn validate_headers(&self, headers: &[(String, String)]) -> Result<(), ScrapeError> {
        let total_size: usize = headers
            .iter()
            .map(|(name, value)| name.len() + value.len() + 2)
            .sum();

        if total_size > self.config.max_header_size {
            warn!(header_size = total_size, "headers too large");
            return Err(ScrapeError::Validation(format!(
                "headers size {total_size} exceeds maximum {}",
                self.config.max_header_size
            )));
        }

        for (name, value) in headers {
            if value.chars().any(|c| c.is_control() && c != '\t') {
                warn!(header = name, "header contains control characters");
                return Err(ScrapeError::Validation(format!(
                    "header {name} contains invalid control characters"
                )));
            }
        }

        debug!(header_count = headers.len(), "header validation passed");
        Ok(())
    }

    pub fn validate_content_size(&self, size: usize) -> Result<(), ScrapeError> {
        if size > self.config.max_content_size {
            warn!(content_size = size, "content too large");
            return Err(ScrapeError::Validation(format!(
                "content size {size} exceeds maximum {}",
                self.config.max_content_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_https_url() {
        let validator = InputValidator::new_default();
        assert!(validator.validate_url("https://example.com/a").is_ok());
    }

    #[test]
    fn rejects_non_http_scheme() {
        let validator = InputValidator::new_default();
        assert!(validator.validate_url("ftp://example.com").is_err());
        assert!(validator.validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn rejects_private_and_loopback_hosts() {
        let validator = InputValidator::new_default();
        assert!(validator.validate_url("https://localhost").is_err());
        assert!(validator.validate_url("https://127.0.0.1").is_err());
        assert!(validator.validate_url("https://192.168.1.1").is_err());
    }

    #[test]
    fn rejects_oversized_headers() {
        let validator = InputValidator::new_default();
        let large = vec![("Large-Header".to_string(), "x".repeat(9000))];
        assert!(validator.validate_headers(&large).is_err());
    }

    #[test]
    fn rejects_control_characters_in_header_value() {
        let validator = InputValidator::new_default();
        let headers = vec![("X-Test".to_string(), "value\r\ninjected".to_string())];
        assert!(validator.validate_headers(&headers).is_err());
    }

    #[test]
    fn rejects_oversized_content() {
        let validator = InputValidator::new_default();
        assert!(validator.validate_content_size(25 * 1024 * 1024).is_err());
    }
}
