//! Crawler domain blocklist (spec.md §4.11 "Blocklist", C12).
//!
//! Initialized once with an empty default blob; a deployment-level config
//! can add blocked roots and whitelist specific domains that would
//! otherwise match.

use std::collections::HashSet;

/// Domain blocklist with whitelist override, matching exact domain, any
/// subdomain of a blocked root, and same-basename-different-TLD variants
/// (e.g. blocking `example.com` also catches `example.net`).
#[derive(Debug, Clone, Default)]
pub struct DomainBlocklist {
    blocked_roots: HashSet<String>,
    whitelist: HashSet<String>,
}

impl DomainBlocklist {
    pub fn new(blocked_roots: impl IntoIterator<Item = String>, whitelist: impl IntoIterator<Item = String>) -> Self {
        Self {
            blocked_roots: blocked_roots.into_iter().map(|d| d.to_lowercase()).collect(),
            whitelist: whitelist.into_iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    /// Empty blocklist — the documented default.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        if self.whitelist.contains(&host) {
            return false;
        }
        self.blocked_roots.iter().any(|root| {
            if self.whitelist.contains(root) {
                return false;
            }
            host == *root
                || host.ends_with(&format!(".{root}"))
                || same_basename_different_tld(&host, root)
        })
    }
}

/// `example.com` vs `example.net`: same registrable label, different TLD.
/// A crude two-label heuristic — good enough for the blocklist's purpose,
/// which is catching obvious ban-evasion re-registrations, not full public
/// suffix list resolution.
fn same_basename_different_tld(host: &str, root: &str) -> bool {
    let host_base = base_label(host);
    let root_base = base_label(root);
    match (host_base, root_base) {
        (Some(h), Some(r)) => h == r,
        _ => false,
    }
}

fn base_label(domain: &str) -> Option<&str> {
    let mut labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    labels.pop(); // drop TLD
    labels.pop() // the registrable label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blocklist_blocks_nothing() {
        let blocklist = DomainBlocklist::empty();
        assert!(!blocklist.is_blocked("example.com"));
    }

    #[test]
    fn blocks_exact_domain() {
        let blocklist = DomainBlocklist::new(["blocked.com".to_string()], []);
        assert!(blocklist.is_blocked("blocked.com"));
        assert!(!blocklist.is_blocked("notblocked.com"));
    }

    #[test]
    fn blocks_subdomain_of_blocked_root() {
        let blocklist = DomainBlocklist::new(["blocked.com".to_string()], []);
        assert!(blocklist.is_blocked("sub.blocked.com"));
        assert!(blocklist.is_blocked("deep.sub.blocked.com"));
    }

    #[test]
    fn blocks_same_basename_different_tld() {
        let blocklist = DomainBlocklist::new(["blocked.com".to_string()], []);
        assert!(blocklist.is_blocked("blocked.net"));
        assert!(blocklist.is_blocked("blocked.org"));
    }

    #[test]
    fn whitelist_overrides_block() {
        let blocklist = DomainBlocklist::new(
            ["blocked.com".to_string()],
            ["sub.blocked.com".to_string()],
        );
        assert!(blocklist.is_blocked("blocked.com"));
        assert!(!blocklist.is_blocked("sub.blocked.com"));
    }

    #[test]
    fn whitelisted_root_clears_tld_variants_too() {
        let blocklist =
            DomainBlocklist::new(["blocked.com".to_string()], ["blocked.com".to_string()]);
        assert!(!blocklist.is_blocked("blocked.com"));
        assert!(!blocklist.is_blocked("blocked.net"));
    }
}
