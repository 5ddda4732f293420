// src/error.rs
// =============================================================================
// Error types for the whole audit pipeline.
//
// There are four families:
// - FetchError: anything that stops a single guarded HTTP fetch
// - SitemapParseError: a sitemap body that is not well-formed XML
// - RenderError: the headless browser fallback could not run
// - AuditError: conditions that abort an entire audit run
//
// Only AuditError ever stops the pipeline. The other three are recorded on
// the page / sitemap / crawl record they belong to and the audit moves on.
// =============================================================================

use std::net::IpAddr;
use thiserror::Error;

/// Why a guarded fetch did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Unparsable URL or a scheme other than http/https
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// URL parsed but carries no usable hostname
    #[error("invalid hostname in {0}")]
    InvalidHostname(String),

    /// Host resolved (or is) an address in a disallowed range
    #[error("unsafe target: {host} resolves to {ip}")]
    UnsafeTarget { host: String, ip: IpAddr },

    /// DNS lookup failed or returned nothing; never treated as safe
    #[error("dns resolution failed for {0}")]
    DnsResolutionFailed(String),

    /// Body exceeded the byte cap; partial data is discarded
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("more than {0} redirects")]
    TooManyRedirects(usize),

    #[error("redirect loop back to {0}")]
    RedirectLoop(String),

    /// Skipped because robots.txt disallows the path
    #[error("disallowed by robots.txt rule '{0}'")]
    RobotsDisallowed(String),

    #[error("request timed out")]
    Timeout,

    /// Any other transport failure (connect, TLS, protocol, missing Location)
    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl FetchError {
    // Stable snake_case code used in JSON records and findings evidence
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::InvalidHostname(_) => "invalid_hostname",
            FetchError::UnsafeTarget { .. } => "unsafe_target",
            FetchError::DnsResolutionFailed(_) => "dns_resolution_failed",
            FetchError::TooLarge { .. } => "too_large",
            FetchError::TooManyRedirects(_) => "too_many_redirects",
            FetchError::RedirectLoop(_) => "redirect_loop",
            FetchError::RobotsDisallowed(_) => "robots_disallowed",
            FetchError::Timeout => "timeout",
            FetchError::Fetch(_) => "fetch_error",
        }
    }

    // Safety failures mean the request was never attempted
    pub fn is_safety_failure(&self) -> bool {
        matches!(
            self,
            FetchError::InvalidUrl(_)
                | FetchError::InvalidHostname(_)
                | FetchError::UnsafeTarget { .. }
                | FetchError::DnsResolutionFailed(_)
        )
    }

    pub fn is_redirect_failure(&self) -> bool {
        matches!(
            self,
            FetchError::TooManyRedirects(_) | FetchError::RedirectLoop(_)
        )
    }
}

/// A sitemap body that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sitemap parse error: {0}")]
pub struct SitemapParseError(pub String);

/// Why the render fallback produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// No browser binary, or the browser could not be launched
    #[error("headless browser unavailable: {0}")]
    HeadlessUnavailable(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("render timed out after {0}s")]
    Timeout(u64),

    /// The homepage failed the same safety check the HTTP client applies
    #[error("render target rejected: {0}")]
    UnsafeTarget(FetchError),
}

/// Conditions that make an audit meaningless.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid target '{0}'")]
    InvalidTarget(String),

    /// The homepage failed a safety check; nothing else is attempted
    #[error("homepage rejected: {0}")]
    UnsafeHomepage(FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(FetchError::Timeout.code(), "timeout");
        assert_eq!(FetchError::TooManyRedirects(10).code(), "too_many_redirects");
        assert_eq!(
            FetchError::DnsResolutionFailed("x.test".into()).code(),
            "dns_resolution_failed"
        );
    }

    #[test]
    fn test_safety_failures() {
        let unsafe_target = FetchError::UnsafeTarget {
            host: "internal.test".into(),
            ip: "10.0.0.1".parse().unwrap(),
        };
        assert!(unsafe_target.is_safety_failure());
        assert!(FetchError::DnsResolutionFailed("x".into()).is_safety_failure());
        assert!(!FetchError::Timeout.is_safety_failure());
        assert!(!FetchError::TooLarge { limit: 1 }.is_safety_failure());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::TooLarge { limit: 1024 };
        assert_eq!(err.to_string(), "response body exceeds 1024 bytes");
    }
}
