//! The Secure Dispatcher (spec.md §4.1, C1): one long-lived `reqwest::Client`
//! per `{skip_tls, allow_cookies}` combination, with an SSRF guard on every
//! connect and normalized transport errors.

use crate::resolver::SsrfGuardResolver;
use crate::ssrf;
use riptide_types::TransportError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Basic proxy credentials, if the deployment routes outbound traffic
/// through one.
#[derive(Debug, Clone)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// Proxy configuration shared by every dispatcher variant.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub uri: String,
    pub credentials: Option<ProxyCredentials>,
}

/// Policy controls that affect how the guard behaves, set once at startup.
#[derive(Debug, Clone)]
pub struct DispatcherPolicy {
    /// When true, connections to non-unicast addresses are permitted. Used
    /// for local development and integration tests against webhook
    /// receivers running on the same host.
    pub allow_local_webhooks: bool,
    pub proxy: Option<ProxyConfig>,
    pub connect_timeout: Duration,
}

impl Default for DispatcherPolicy {
    fn default() -> Self {
        Self {
            allow_local_webhooks: false,
            proxy: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Index into the four logical dispatchers spec.md §4.1 describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatcherKey {
    pub skip_tls: bool,
    pub allow_cookies: bool,
}

impl DispatcherKey {
    pub fn new(skip_tls: bool, allow_cookies: bool) -> Self {
        Self {
            skip_tls,
            allow_cookies,
        }
    }

    fn all() -> [DispatcherKey; 4] {
        [
            DispatcherKey::new(false, false),
            DispatcherKey::new(false, true),
            DispatcherKey::new(true, false),
            DispatcherKey::new(true, true),
        ]
    }
}

/// Multiplexes outbound connections across the four `{skipTls,
/// allowCookies}` combinations spec.md §4.1 names, applying the SSRF guard
/// and proxy policy uniformly. Each combination gets its own long-lived
/// `reqwest::Client` so connection pooling and cookie jars stay isolated
/// per policy, exactly as the source dispatcher keeps four separate agent
/// pools.
pub struct SecureDispatcher {
    clients: HashMap<DispatcherKey, reqwest::Client>,
    policy: DispatcherPolicy,
}

impl SecureDispatcher {
    /// Builds all four clients up front; building lazily would mean the
    /// first request on a cold combination pays TLS-backend setup cost.
    pub fn new(policy: DispatcherPolicy) -> Result<Arc<Self>, TransportError> {
        let mut clients = HashMap::with_capacity(4);
        for key in DispatcherKey::all() {
            clients.insert(key, build_client(key, &policy)?);
        }
        Ok(Arc::new(Self { clients, policy }))
    }

    pub fn client(&self, key: DispatcherKey) -> &reqwest::Client {
        self.clients
            .get(&key)
            .expect("all four dispatcher combinations are built in SecureDispatcher::new")
    }

    /// Pre-flight check against the URL's host string: catches literal IPs
    /// and `localhost` before a request is even built. It cannot see through
    /// a hostname that only resolves to a private address at connect time —
    /// that resolution-time check is `SsrfGuardResolver`, wired into every
    /// client this dispatcher builds via `dns_resolver`, which runs on every
    /// connection attempt regardless of whether callers invoke this method.
    pub fn guard_host(&self, url: &Url) -> Result<(), TransportError> {
        if self.policy.allow_local_webhooks {
            return Ok(());
        }
        let Some(host) = url.host_str() else {
            return Ok(());
        };
        if host.eq_ignore_ascii_case("localhost") || ssrf::host_is_literal_private_ip(host) {
            warn!(host, "blocked dispatch to non-unicast address");
            return Err(TransportError::InsecureConnection(format!(
                "refused connection to non-unicast address: {host}"
            )));
        }
        Ok(())
    }

    pub fn policy(&self) -> &DispatcherPolicy {
        &self.policy
    }
}

fn build_client(
    key: DispatcherKey,
    policy: &DispatcherPolicy,
) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(policy.connect_timeout)
        .danger_accept_invalid_certs(key.skip_tls)
        .cookie_store(key.allow_cookies)
        .dns_resolver(SsrfGuardResolver::new(policy.allow_local_webhooks));

    if let Some(proxy_config) = &policy.proxy {
        let mut proxy = reqwest::Proxy::all(&proxy_config.uri)
            .map_err(|e| TransportError::ProxySelection(e.to_string()))?;
        if let Some(creds) = &proxy_config.credentials {
            proxy = proxy.basic_auth(&creds.username, &creds.password);
        }
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| TransportError::ProxySelection(e.to_string()))
}

/// Normalizes a `reqwest::Error` into the taxonomy spec.md §4.1/§7 names:
/// TLS failures become `Ssl`, DNS failures become `Dns`, everything else
/// becomes a generic `Network` error.
pub fn normalize_transport_error(err: &reqwest::Error) -> TransportError {
    if err.is_connect() {
        let message = err.to_string();
        if message.contains("certificate") || message.contains("tls") || message.contains("TLS") {
            return TransportError::Ssl(message);
        }
        if message.contains("dns") || message.contains("resolve") || message.contains("lookup") {
            return TransportError::Dns(message);
        }
    }
    if err.is_timeout() {
        return TransportError::Network(format!("timed out: {err}"));
    }
    TransportError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_all_four_combinations() {
        let dispatcher = SecureDispatcher::new(DispatcherPolicy::default()).unwrap();
        for key in DispatcherKey::all() {
            let _ = dispatcher.client(key);
        }
    }

    #[test]
    fn guard_blocks_private_host_by_default() {
        let dispatcher = SecureDispatcher::new(DispatcherPolicy::default()).unwrap();
        let url = Url::parse("http://127.0.0.1:9000/hook").unwrap();
        assert!(dispatcher.guard_host(&url).is_err());
    }

    #[test]
    fn guard_allows_private_host_when_policy_enabled() {
        let policy = DispatcherPolicy {
            allow_local_webhooks: true,
            ..Default::default()
        };
        let dispatcher = SecureDispatcher::new(policy).unwrap();
        let url = Url::parse("http://127.0.0.1:9000/hook").unwrap();
        assert!(dispatcher.guard_host(&url).is_ok());
    }

    #[test]
    fn guard_allows_public_host() {
        let dispatcher = SecureDispatcher::new(DispatcherPolicy::default()).unwrap();
        let url = Url::parse("https://example.com").unwrap();
        assert!(dispatcher.guard_host(&url).is_ok());
    }
}
