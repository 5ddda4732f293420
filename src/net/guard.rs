// src/net/guard.rs
// =============================================================================
// SSRF guard: decides whether a URL may be fetched at all.
//
// The check runs in three steps:
// 1. The URL must parse, use http/https, and carry a hostname
// 2. The hostname is resolved (IP literals skip DNS); a failed or empty
//    lookup fails closed
// 3. EVERY resolved address must be outside the disallowed ranges
//
// The first address of a passing answer is returned as the pin. The
// transport connects to exactly that address, so a second (rebinding) DNS
// answer can never be used between check and connect.
// =============================================================================

use crate::error::FetchError;
use crate::net::resolver::Resolver;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::{Host, Url};

/// Address ranges a fetch must never reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeRange {
    Unspecified,
    Loopback,
    Private,
    LinkLocal,
    UniqueLocal,
    /// 100.64.0.0/10 carrier-grade NAT
    SharedAddressSpace,
    /// 0.0.0.0/8 and 240.0.0.0/4 (which includes 255.255.255.255)
    Reserved,
    /// 224.0.0.0/4 and ff00::/8
    Multicast,
    /// TEST-NET-1/2/3 and 2001:db8::/32
    Documentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "range", rename_all = "snake_case")]
pub enum AddressSafety {
    Safe,
    Unsafe(UnsafeRange),
}

/// A hostname together with one address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAddress {
    pub host: String,
    pub ip: IpAddr,
    pub safety: AddressSafety,
}

impl ResolvedAddress {
    pub fn new(host: &str, ip: IpAddr) -> Self {
        Self {
            host: host.to_string(),
            ip,
            safety: classify_ip(ip),
        }
    }

    pub fn is_safe(&self) -> bool {
        self.safety == AddressSafety::Safe
    }
}

/// A URL that passed the guard, pinned to the checked socket address.
#[derive(Debug, Clone)]
pub struct PinnedTarget {
    pub url: Url,
    pub address: ResolvedAddress,
    pub socket: SocketAddr,
}

// Classifies a single IP address
pub fn classify_ip(ip: IpAddr) -> AddressSafety {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

fn classify_v4(ip: Ipv4Addr) -> AddressSafety {
    let octets = ip.octets();
    let range = if ip.is_unspecified() {
        Some(UnsafeRange::Unspecified)
    } else if ip.is_loopback() {
        Some(UnsafeRange::Loopback)
    } else if ip.is_private() {
        Some(UnsafeRange::Private)
    } else if ip.is_link_local() {
        Some(UnsafeRange::LinkLocal)
    } else if octets[0] == 100 && (octets[1] & 0xc0) == 64 {
        Some(UnsafeRange::SharedAddressSpace)
    } else if ip.is_multicast() {
        Some(UnsafeRange::Multicast)
    } else if octets[0] == 0 || octets[0] >= 240 {
        Some(UnsafeRange::Reserved)
    } else if matches!(&octets[..3], [192, 0, 2] | [198, 51, 100] | [203, 0, 113]) {
        Some(UnsafeRange::Documentation)
    } else {
        None
    };

    match range {
        Some(range) => AddressSafety::Unsafe(range),
        None => AddressSafety::Safe,
    }
}

fn classify_v6(ip: Ipv6Addr) -> AddressSafety {
    if ip.is_unspecified() {
        return AddressSafety::Unsafe(UnsafeRange::Unspecified);
    }
    if ip.is_loopback() {
        return AddressSafety::Unsafe(UnsafeRange::Loopback);
    }
    // Forms that carry an IPv4 destination are judged by that address
    if let Some(embedded) = embedded_v4(ip) {
        return classify_v4(embedded);
    }

    let segments = ip.segments();
    let first = segments[0];
    if (first & 0xfe00) == 0xfc00 {
        // fc00::/7
        AddressSafety::Unsafe(UnsafeRange::UniqueLocal)
    } else if (first & 0xffc0) == 0xfe80 {
        // fe80::/10
        AddressSafety::Unsafe(UnsafeRange::LinkLocal)
    } else if (first & 0xff00) == 0xff00 {
        AddressSafety::Unsafe(UnsafeRange::Multicast)
    } else if first == 0x2001 && segments[1] == 0x0db8 {
        AddressSafety::Unsafe(UnsafeRange::Documentation)
    } else {
        AddressSafety::Safe
    }
}

// The IPv4 address inside a mapped (::ffff:a.b.c.d), compatible
// (::a.b.c.d), NAT64 (64:ff9b::/96) or 6to4 (2002::/16) address
fn embedded_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return Some(mapped);
    }
    let s = ip.segments();
    let from = |hi: u16, lo: u16| Ipv4Addr::new((hi >> 8) as u8, hi as u8, (lo >> 8) as u8, lo as u8);

    if s[..6].iter().all(|seg| *seg == 0) {
        Some(from(s[6], s[7]))
    } else if s[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        Some(from(s[6], s[7]))
    } else if s[0] == 0x2002 {
        Some(from(s[1], s[2]))
    } else {
        None
    }
}

// Parses a URL and rejects anything that is not http(s) with a hostname
pub fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(FetchError::InvalidUrl(raw.to_string())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(FetchError::InvalidHostname(raw.to_string())),
    }
}

// Resolves the URL's host and checks every answer.
//
// Returns the pinned target on success. No socket is opened here; the only
// network activity is the resolver call itself.
pub async fn check_url(url: &Url, resolver: &dyn Resolver) -> Result<PinnedTarget, FetchError> {
    let port = url
        .port_or_known_default()
        .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;

    let (host_label, addresses) = match url.host() {
        Some(Host::Ipv4(ip)) => (ip.to_string(), vec![IpAddr::V4(ip)]),
        Some(Host::Ipv6(ip)) => (ip.to_string(), vec![IpAddr::V6(ip)]),
        Some(Host::Domain(domain)) if !domain.is_empty() => {
            let answers = resolver
                .resolve(domain, port)
                .await
                .map_err(|_| FetchError::DnsResolutionFailed(domain.to_string()))?;
            (domain.to_string(), answers)
        }
        _ => return Err(FetchError::InvalidHostname(url.to_string())),
    };

    if addresses.is_empty() {
        return Err(FetchError::DnsResolutionFailed(host_label));
    }

    let resolved: Vec<ResolvedAddress> = addresses
        .iter()
        .map(|ip| ResolvedAddress::new(&host_label, *ip))
        .collect();

    if let Some(bad) = resolved.iter().find(|addr| !addr.is_safe()) {
        tracing::warn!(host = %host_label, ip = %bad.ip, "rejecting unsafe target");
        return Err(FetchError::UnsafeTarget {
            host: host_label,
            ip: bad.ip,
        });
    }

    let address = resolved[0].clone();
    Ok(PinnedTarget {
        url: url.clone(),
        socket: SocketAddr::new(address.ip, port),
        address,
    })
}
