//! Environment-driven process configuration (spec.md §6 "Environment
//! variables").

use riptide_security::{ProxyConfig, ProxyCredentials};
use riptide_types::Thresholds;
use std::path::PathBuf;

/// Everything read from the environment at startup. Nothing here is
/// hot-reloaded; a deployment that needs to change one of these restarts
/// the process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub logging_level: String,
    pub proxy: Option<ProxyConfig>,
    pub allow_local_webhooks: bool,
    pub playwright_microservice_url: Option<String>,
    pub expose_error_details: bool,
    pub expose_error_stack: bool,
    pub gatekeeper_rules_path: Option<PathBuf>,
    pub gatekeeper_thresholds: Thresholds,
    /// Team policy gate for the Robots Evaluator (spec.md §4.9: "The
    /// evaluator is called only when the team policy `checkRobotsOnScrape`
    /// is true"). Not in spec.md's enumerated env var list; added here as
    /// the ambient knob that policy needs a home.
    pub check_robots_on_scrape: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let thresholds = Thresholds::default();
        Self {
            host: env_string("HOST", "0.0.0.0"),
            port: env_string("PORT", "8080").parse().unwrap_or(8080),
            logging_level: env_string("LOGGING_LEVEL", "info"),
            proxy: proxy_from_env(),
            allow_local_webhooks: env_bool("ALLOW_LOCAL_WEBHOOKS", false),
            playwright_microservice_url: std::env::var("PLAYWRIGHT_MICROSERVICE_URL").ok(),
            expose_error_details: env_bool("EXPOSE_ERROR_DETAILS", false),
            expose_error_stack: env_bool("EXPOSE_ERROR_STACK", false),
            gatekeeper_rules_path: std::env::var("GATEKEEPER_RULES_PATH").ok().map(PathBuf::from),
            gatekeeper_thresholds: Thresholds {
                min_html_bytes: env_usize("MIN_HTML_BYTES", thresholds.min_html_bytes),
                min_visible_text_chars: env_usize(
                    "MIN_VISIBLE_TEXT_CHARS",
                    thresholds.min_visible_text_chars,
                ),
                min_main_content_chars: env_usize(
                    "MIN_MAIN_CONTENT_CHARS",
                    thresholds.min_main_content_chars,
                ),
                require_structured_data: thresholds.require_structured_data,
            },
            check_robots_on_scrape: env_bool("CHECK_ROBOTS_ON_SCRAPE", true),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn proxy_from_env() -> Option<ProxyConfig> {
    let uri = std::env::var("PROXY_SERVER").ok()?;
    let credentials = match (
        std::env::var("PROXY_USERNAME").ok(),
        std::env::var("PROXY_PASSWORD").ok(),
    ) {
        (Some(username), Some(password)) => Some(ProxyCredentials { username, password }),
        _ => None,
    };
    Some(ProxyConfig { uri, credentials })
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_combines_host_and_port() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            logging_level: "info".to_string(),
            proxy: None,
            allow_local_webhooks: false,
            playwright_microservice_url: None,
            expose_error_details: false,
            expose_error_stack: false,
            gatekeeper_rules_path: None,
            gatekeeper_thresholds: Thresholds::default(),
            check_robots_on_scrape: true,
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
