//! DNS-resolution-time enforcement of the SSRF guard (spec.md §4.1, I6).
//!
//! `guard_host` only catches literal-IP hosts before a request is even
//! built; a hostname that resolves into a private range would sail
//! through that check and reach `connect()` anyway. This resolver plugs
//! into every [`reqwest::Client`] via `ClientBuilder::dns_resolver` so the
//! non-unicast check runs against the addresses DNS actually returns,
//! on every connection attempt, not just the literal-IP fast path.

use crate::ssrf::is_non_unicast;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::SocketAddr;
use std::sync::Arc;

/// Wraps system DNS resolution (via `tokio::net::lookup_host`) with the
/// same non-unicast filter `guard_host` applies to literal IPs. Built once
/// per `allow_local_webhooks` policy and shared across all four dispatcher
/// clients that use that policy.
pub struct SsrfGuardResolver {
    allow_local_webhooks: bool,
}

impl SsrfGuardResolver {
    pub fn new(allow_local_webhooks: bool) -> Arc<Self> {
        Arc::new(Self { allow_local_webhooks })
    }
}

impl Resolve for SsrfGuardResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let allow_local_webhooks = self.allow_local_webhooks;
        let host = name.as_str().to_string();
        Box::pin(async move {
            // Port is irrelevant to the address family/range check; `0` is
            // the conventional placeholder since `reqwest` substitutes the
            // real destination port when it connects the returned addresses.
            let resolved: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?
                .collect();

            if !allow_local_webhooks {
                if let Some(blocked) = resolved.iter().find(|addr| is_non_unicast(addr.ip())) {
                    return Err(format!(
                        "refused connection to non-unicast address: {} (resolved from {host})",
                        blocked.ip()
                    )
                    .into());
                }
            }

            let addrs: Addrs = Box::new(resolved.into_iter());
            Ok(addrs)
        })
    }
}
