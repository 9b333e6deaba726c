//! Private-address-range detection backing the Secure Dispatcher's SSRF
//! guard (spec.md §4.1, invariant I6).
//!
//! Extends the private-range table the input validator's own quick check
//! encodes (10/8, 172.16/12, 192.168/16, 127/8, 169.254/16) to the full
//! non-unicast set spec.md (I6) requires: loopback, link-local, private,
//! multicast, and reserved/CGN ranges, for both IPv4 and IPv6.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// `true` if `ip` is in any non-unicast range that should be blocked unless
/// the "allow local webhooks" policy is explicitly enabled.
pub fn is_non_unicast(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_non_unicast_v4(v4),
        IpAddr::V6(v6) => is_non_unicast_v6(v6),
    }
}

fn is_non_unicast_v4(ip: Ipv4Addr) -> bool {
    if ip.is_loopback()
        || ip.is_link_local()
        || ip.is_private()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_unspecified()
        || ip.is_documentation()
    {
        return true;
    }
    let octets = ip.octets();
    // 100.64.0.0/10 — carrier-grade NAT (RFC 6598), not covered by std's
    // `is_private`.
    if octets[0] == 100 && (64..=127).contains(&octets[1]) {
        return true;
    }
    false
}

fn is_non_unicast_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() || ip.is_multicast() {
        return true;
    }
    // Unique local addresses (fc00::/7) and link-local (fe80::/10).
    let segments = ip.segments();
    (segments[0] & 0xfe00) == 0xfc00 || (segments[0] & 0xffc0) == 0xfe80
}

/// Resolves the non-unicast check against a hostname that may itself be a
/// literal IP address (the common case for SSRF probes). This only covers
/// the literal-IP fast path; hostnames that require DNS resolution are
/// checked at connect time by `SsrfGuardResolver`, which applies this same
/// `is_non_unicast` filter to the addresses DNS actually returns.
pub fn host_is_literal_private_ip(host: &str) -> bool {
    host.parse::<IpAddr>()
        .map(is_non_unicast)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_loopback_and_private_v4() {
        assert!(is_non_unicast("127.0.0.1".parse().unwrap()));
        assert!(is_non_unicast("10.0.0.5".parse().unwrap()));
        assert!(is_non_unicast("172.16.0.1".parse().unwrap()));
        assert!(is_non_unicast("192.168.1.1".parse().unwrap()));
        assert!(is_non_unicast("169.254.1.1".parse().unwrap()));
        assert!(is_non_unicast("100.64.0.1".parse().unwrap()));
        assert!(is_non_unicast("224.0.0.1".parse().unwrap()));
    }

    #[test]
    fn allows_public_v4() {
        assert!(!is_non_unicast("8.8.8.8".parse().unwrap()));
        assert!(!is_non_unicast("93.184.216.34".parse().unwrap()));
    }

    #[test]
    fn blocks_loopback_and_link_local_v6() {
        assert!(is_non_unicast("::1".parse().unwrap()));
        assert!(is_non_unicast("fe80::1".parse().unwrap()));
        assert!(is_non_unicast("fc00::1".parse().unwrap()));
    }

    #[test]
    fn allows_public_v6() {
        assert!(!is_non_unicast("2001:4860:4860::8888".parse().unwrap()));
    }

    #[test]
    fn literal_ip_hostname_detected() {
        assert!(host_is_literal_private_ip("127.0.0.1"));
        assert!(!host_is_literal_private_ip("example.com"));
    }
}
