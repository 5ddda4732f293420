// src/crawl/pages.rs
// =============================================================================
// Per-run memo of traced page fetches.
//
// BFS discovery, page analysis, canonical-target checks and the sitemap
// sample all ask for pages through one PageFetcher, so a URL is requested at
// most once per audit no matter how many of them care about it.
//
// Records are keyed by the parsed URL without its fragment. Spellings the
// url crate treats as equal (host case, default port, a missing root path)
// share one record.
// =============================================================================

use crate::crawl::robots::RobotsPolicy;
use crate::error::FetchError;
use crate::net::{GuardedHttpClient, PageFetch};
use std::collections::HashMap;
use url::Url;

pub struct PageFetcher<'a> {
    client: &'a GuardedHttpClient,
    max_bytes: usize,
    memo: HashMap<String, PageFetch>,
    network_fetches: usize,
}

impl<'a> PageFetcher<'a> {
    pub fn new(client: &'a GuardedHttpClient, max_bytes: usize) -> Self {
        Self {
            client,
            max_bytes,
            memo: HashMap::new(),
            network_fetches: 0,
        }
    }

    // Traces the URL once; later calls return the stored record
    pub async fn fetch(&mut self, url: &str) -> &PageFetch {
        let key = memo_key(url);
        if !self.memo.contains_key(&key) {
            let page = self.client.trace(&key, self.max_bytes).await;
            self.network_fetches += 1;
            self.memo.insert(key.clone(), page);
        }
        self.memo.entry(key).or_default()
    }

    // Like fetch, but refuses URLs robots.txt disallows in this run.
    // Refused URLs are not stored, so another caller may still fetch them.
    pub async fn fetch_allowed(&mut self, url: &str, robots: &RobotsPolicy) -> Result<&PageFetch, FetchError> {
        if let Ok(parsed) = Url::parse(url) {
            robots.check(&parsed)?;
        }
        Ok(self.fetch(url).await)
    }

    pub fn is_fetched(&self, url: &str) -> bool {
        self.memo.contains_key(&memo_key(url))
    }

    // Requests that actually reached the client (memo hits excluded)
    pub fn network_fetches(&self) -> usize {
        self.network_fetches
    }
}

// Unparsable input is kept verbatim; the client rejects it on fetch
fn memo_key(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::resolver::StaticResolver;
    use crate::net::transport::{PinnedRequest, RawResponse, Transport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTransport(AtomicUsize);

    #[async_trait]
    impl Transport for CountingTransport {
        async fn send(&self, _request: &PinnedRequest) -> Result<RawResponse, FetchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RawResponse {
                status: 200,
                headers: vec![("content-type".into(), "text/html".into())],
                body: b"<html></html>".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn test_each_url_fetched_once() {
        let transport = Arc::new(CountingTransport(AtomicUsize::new(0)));
        let resolver = StaticResolver::new().with("example.com", &["93.184.216.34"]);
        let client = GuardedHttpClient::new(Arc::new(resolver), transport.clone(), 10);
        let mut pages = PageFetcher::new(&client, 1024);

        assert_eq!(pages.fetch("https://example.com/").await.final_status, Some(200));
        pages.fetch("https://example.com/").await;
        pages.fetch("https://example.com/about").await;

        assert_eq!(transport.0.load(Ordering::SeqCst), 2);
        assert_eq!(pages.network_fetches(), 2);
        assert!(pages.is_fetched("https://example.com/about"));
    }

    #[tokio::test]
    async fn test_equivalent_spellings_share_one_fetch() {
        let transport = Arc::new(CountingTransport(AtomicUsize::new(0)));
        let resolver = StaticResolver::new().with("example.com", &["93.184.216.34"]);
        let client = GuardedHttpClient::new(Arc::new(resolver), transport.clone(), 10);
        let mut pages = PageFetcher::new(&client, 1024);

        pages.fetch("https://example.com/").await;
        pages.fetch("https://example.com").await;
        pages.fetch("https://EXAMPLE.com:443/").await;
        pages.fetch("https://example.com/#top").await;
        pages.fetch("https://example.com/despre").await;
        pages.fetch("https://Example.COM/despre#echipa").await;

        assert_eq!(transport.0.load(Ordering::SeqCst), 2);
        assert!(pages.is_fetched("https://example.com/despre#anything"));
        assert!(!pages.is_fetched("https://example.com/despre/"));
    }

    #[tokio::test]
    async fn test_robots_refusal_is_not_memoized() {
        let transport = Arc::new(CountingTransport(AtomicUsize::new(0)));
        let resolver = StaticResolver::new().with("example.com", &["93.184.216.34"]);
        let client = GuardedHttpClient::new(Arc::new(resolver), transport.clone(), 10);
        let robots = RobotsPolicy::from_outcome(
            "https://example.com/robots.txt",
            Ok((200, "User-agent: *\nDisallow: /private".into())),
            false,
            "indexguard",
        );
        let mut pages = PageFetcher::new(&client, 1024);

        let refused = pages.fetch_allowed("https://example.com/private/x", &robots).await;
        assert!(matches!(refused, Err(FetchError::RobotsDisallowed(_))));
        assert!(!pages.is_fetched("https://example.com/private/x"));
        assert_eq!(transport.0.load(Ordering::SeqCst), 0);
    }
}
