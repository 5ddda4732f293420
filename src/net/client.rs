// src/net/client.rs
// =============================================================================
// GuardedHttpClient: the only way the audit talks to the network over HTTP.
//
// Every request, including every redirect hop, goes through the same steps:
// 1. Parse + scheme check
// 2. Resolve and check all addresses (net::guard)
// 3. Send to the pinned address (net::transport)
// 4. On 301/302/303/307/308, resolve Location against the current URL and
//    loop back to step 1
//
// `fetch` returns a Result and is used where the caller needs the body or
// the error. `trace` never fails; it turns the same walk into a PageFetch
// record that the crawl and the findings engine read.
// =============================================================================

use crate::config::AuditConfig;
use crate::error::FetchError;
use crate::net::guard::{check_url, parse_http_url};
use crate::net::resolver::{Resolver, SystemResolver};
use crate::net::transport::{PinnedRequest, RawResponse, ReqwestTransport, Transport};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use url::Url;

// Header values never copied into a report
const SENSITIVE_HEADERS: [&str; 6] = [
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
];

pub const REDACTED: &str = "[REDACTED]";

/// One redirect response in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectHop {
    pub url: String,
    pub status: u16,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub final_url: Url,
    /// Lower-cased names, sensitive values redacted, repeats joined with ", "
    pub headers: BTreeMap<String, String>,
    pub redirect_chain: Vec<RedirectHop>,
}

impl FetchResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// The outcome of tracing one page URL. Always produced, even on failure.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageFetch {
    pub requested_url: String,
    /// Where the walk ended (the last URL attempted when it failed)
    pub final_url: String,
    pub final_status: Option<u16>,
    pub redirect_chain: Vec<RedirectHop>,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    #[serde(rename = "loop")]
    pub redirect_loop: bool,
    #[serde(rename = "too_many")]
    pub too_many_redirects: bool,
    /// FetchError::code() of the failure, if any
    pub error: Option<String>,
    pub error_detail: Option<String>,
    /// Decoded body; kept in memory for signal extraction only
    #[serde(skip)]
    pub body: String,
    /// The typed error behind `error`
    #[serde(skip)]
    pub failure: Option<FetchError>,
}

impl PageFetch {
    // A record for a URL that was never requested
    pub fn not_attempted(url: &str, error: &FetchError) -> Self {
        Self {
            requested_url: url.to_string(),
            final_url: url.to_string(),
            error: Some(error.code().to_string()),
            error_detail: Some(error.to_string()),
            failure: Some(error.clone()),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.final_status == Some(200) && self.error.is_none()
    }

    pub fn is_robots_skipped(&self) -> bool {
        self.error.as_deref() == Some("robots_disallowed")
    }

    // A missing content type is treated as HTML; servers omit it often enough
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            }
            None => !self.body.is_empty(),
        }
    }
}

// Mutable state of one redirect walk, readable after a failure
#[derive(Debug, Default)]
struct Walk {
    chain: Vec<RedirectHop>,
    last_url: String,
}

#[derive(Clone)]
pub struct GuardedHttpClient {
    resolver: Arc<dyn Resolver>,
    transport: Arc<dyn Transport>,
    max_redirects: usize,
}

impl GuardedHttpClient {
    pub fn new(resolver: Arc<dyn Resolver>, transport: Arc<dyn Transport>, max_redirects: usize) -> Self {
        Self {
            resolver,
            transport,
            max_redirects,
        }
    }

    // System DNS + reqwest, configured from the audit config
    pub fn from_config(config: &AuditConfig) -> Self {
        let transport = ReqwestTransport::new(config.request_timeout(), config.user_agent.clone());
        let resolver = SystemResolver::new(config.request_timeout());
        Self::new(Arc::new(resolver), Arc::new(transport), config.max_redirects)
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    pub async fn fetch(
        &self,
        url: &str,
        max_bytes: usize,
        max_redirects: usize,
    ) -> Result<FetchResponse, FetchError> {
        let mut walk = Walk::default();
        self.walk(url, max_bytes, max_redirects, &mut walk).await
    }

    pub async fn trace(&self, url: &str, max_bytes: usize) -> PageFetch {
        let mut walk = Walk::default();
        let result = self.walk(url, max_bytes, self.max_redirects, &mut walk).await;

        match result {
            Ok(response) => {
                let content_type = response.content_type().map(str::to_string);
                PageFetch {
                    requested_url: url.to_string(),
                    final_url: response.final_url.to_string(),
                    final_status: Some(response.status),
                    content_type,
                    body: response.text(),
                    headers: response.headers,
                    redirect_chain: response.redirect_chain,
                    ..Default::default()
                }
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "trace failed");
                let last_url = if walk.last_url.is_empty() {
                    url.to_string()
                } else {
                    walk.last_url
                };
                // Loop / overflow still report the status of the last hop
                let final_status = if err.is_redirect_failure() {
                    walk.chain.last().map(|hop| hop.status)
                } else {
                    None
                };
                PageFetch {
                    requested_url: url.to_string(),
                    final_url: last_url,
                    final_status,
                    redirect_chain: walk.chain,
                    redirect_loop: matches!(err, FetchError::RedirectLoop(_)),
                    too_many_redirects: matches!(err, FetchError::TooManyRedirects(_)),
                    error: Some(err.code().to_string()),
                    error_detail: Some(err.to_string()),
                    failure: Some(err),
                    ..Default::default()
                }
            }
        }
    }

    async fn walk(
        &self,
        url: &str,
        max_bytes: usize,
        max_redirects: usize,
        walk: &mut Walk,
    ) -> Result<FetchResponse, FetchError> {
        let mut current = parse_http_url(url)?;
        walk.last_url = current.to_string();
        let mut visited: HashSet<String> = HashSet::from([current.to_string()]);

        loop {
            let pinned = check_url(&current, self.resolver.as_ref()).await?;
            let request = PinnedRequest {
                url: current.clone(),
                addr: pinned.socket,
                max_bytes,
            };
            let raw = self.transport.send(&request).await?;

            if !raw.is_redirect() {
                return Ok(FetchResponse {
                    status: raw.status,
                    headers: redact_headers(&raw.headers),
                    body: raw.body,
                    final_url: current,
                    redirect_chain: std::mem::take(&mut walk.chain),
                });
            }

            current = next_hop(&current, &raw, walk)?;
            let key = current.to_string();
            walk.last_url = key.clone();

            if !visited.insert(key.clone()) {
                tracing::debug!(url = %key, "redirect loop");
                return Err(FetchError::RedirectLoop(key));
            }
            if walk.chain.len() > max_redirects {
                return Err(FetchError::TooManyRedirects(max_redirects));
            }
        }
    }
}

// Records the hop and returns the validated next URL
fn next_hop(current: &Url, raw: &RawResponse, walk: &mut Walk) -> Result<Url, FetchError> {
    let location = raw
        .header("location")
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .ok_or_else(|| FetchError::Fetch(format!("{} redirect without Location", raw.status)))?
        .to_string();

    walk.chain.push(RedirectHop {
        url: current.to_string(),
        status: raw.status,
        location: location.clone(),
    });

    let next = current
        .join(&location)
        .map_err(|_| FetchError::InvalidUrl(location.clone()))?;
    parse_http_url(next.as_str())
}

// Lower-cases header names and hides credential-bearing values
pub fn redact_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
            REDACTED.to_string()
        } else {
            value.clone()
        };
        out.entry(name)
            .and_modify(|existing| {
                if existing != REDACTED {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
            })
            .or_insert(value);
    }
    out
}
