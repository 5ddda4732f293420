// src/net/transport.rs
// =============================================================================
// Sends exactly one HTTP GET to an already-checked, pinned address.
//
// The transport knows nothing about redirects or safety ranges. It is handed
// a URL plus the socket address the guard approved and must connect there
// and nowhere else. The reqwest implementation builds a fresh client per
// request so that:
// - the pin (`ClientBuilder::resolve`) applies to this request only
// - no pooled connection from an earlier host can be reused
// - proxies and automatic redirects are off
//
// Bodies are streamed chunk by chunk and abandoned as soon as they exceed
// the byte cap.
// =============================================================================

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

/// One request the transport must perform.
#[derive(Debug, Clone)]
pub struct PinnedRequest {
    pub url: Url,
    /// The address the guard checked; the connection must go here
    pub addr: SocketAddr,
    pub max_bytes: usize,
}

/// A response before any redirect handling or header redaction.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    /// Header names as received; repeated headers appear more than once
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    // Only statuses that carry a Location by definition; 300 and 304 are final
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PinnedRequest) -> Result<RawResponse, FetchError>;
}

/// The production transport, backed by reqwest + rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    timeout: Duration,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }

    fn client_for(&self, request: &PinnedRequest) -> Result<Client, FetchError> {
        let host = request
            .url
            .host_str()
            .ok_or_else(|| FetchError::InvalidHostname(request.url.to_string()))?;

        Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(redirect::Policy::none())
            .no_proxy()
            .pool_max_idle_per_host(0)
            // reqwest takes the port from the URL; only the IP of the pin matters
            .resolve(host, request.addr)
            .build()
            .map_err(|e| FetchError::Fetch(format!("could not build http client: {e}")))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &PinnedRequest) -> Result<RawResponse, FetchError> {
        let client = self.client_for(request)?;

        let mut response = client
            .get(request.url.clone())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        // Redirect bodies are never needed
        if matches!(status, 301 | 302 | 303 | 307 | 308) {
            return Ok(RawResponse {
                status,
                headers,
                body: Vec::new(),
            });
        }

        if let Some(declared) = response.content_length() {
            if declared > request.max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: request.max_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(categorize_error)? {
            if body.len() + chunk.len() > request.max_bytes {
                tracing::debug!(url = %request.url, limit = request.max_bytes, "body over cap");
                return Err(FetchError::TooLarge {
                    limit: request.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

// Maps reqwest's error kinds onto FetchError
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Fetch(format!("connection failed: {error}"))
    } else {
        FetchError::Fetch(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = RawResponse {
            status: 301,
            headers: vec![("Location".into(), "/next".into())],
            body: Vec::new(),
        };
        assert_eq!(response.header("location"), Some("/next"));
        assert!(response.is_redirect());
    }

    #[test]
    fn test_client_requires_host() {
        let transport = ReqwestTransport::new(Duration::from_secs(1), "test");
        let request = PinnedRequest {
            url: Url::parse("data:text/plain,hi").unwrap(),
            addr: "93.184.216.34:80".parse().unwrap(),
            max_bytes: 10,
        };
        assert!(matches!(
            transport.client_for(&request),
            Err(FetchError::InvalidHostname(_))
        ));
    }
}
