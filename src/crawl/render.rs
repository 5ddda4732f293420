// src/crawl/render.rs
// =============================================================================
// Headless-browser fallback for sites whose links only exist after
// JavaScript runs.
//
// It is a last resort, not a crawler: one page (the homepage) is loaded
// once and the rendered DOM plus observed network requests are mined for
// same-host page URLs. Before the browser starts, the homepage host goes
// through the same SSRF check as every HTTP fetch, and Chromium is told to
// resolve that host to the checked address only.
//
// Anything that goes wrong (no Chromium binary, navigation error, timeout)
// becomes RenderOutcome::Degraded. The audit then continues with the URLs
// it already had.
// =============================================================================

use crate::config::AuditConfig;
use crate::crawl::normalize::accept_candidate;
use crate::error::RenderError;
use crate::net::guard::check_url;
use crate::net::Resolver;
use crate::signals::html::dom_candidates;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// The page to render and the address its host must resolve to.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub url: Url,
    pub pin: SocketAddr,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    /// Every request URL the page issued while loading
    pub network_urls: Vec<String>,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, target: &RenderTarget) -> Result<RenderedPage, RenderError>;
}

/// How many accepted candidates each source contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HarvestCounts {
    pub from_href: usize,
    pub from_data: usize,
    pub from_onclick: usize,
    pub from_network: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Candidates are sorted, deduped and capped
    Rendered {
        #[serde(skip)]
        candidates: Vec<String>,
        counts: HarvestCounts,
    },
    Degraded {
        reason: String,
    },
}

// Filters raw rendered candidates down to same-host HTML page URLs.
// Source order decides which source gets credit for a URL seen twice.
pub fn harvest(page: &RenderedPage, homepage: &Url, site_root: &Url, max_urls: usize) -> (Vec<String>, HarvestCounts) {
    let dom = dom_candidates(&page.html);
    let mut counts = HarvestCounts::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut accepted: Vec<String> = Vec::new();

    let sources: [(&[String], &mut usize); 4] = [
        (dom.hrefs.as_slice(), &mut counts.from_href),
        (dom.data_attrs.as_slice(), &mut counts.from_data),
        (dom.inline_js.as_slice(), &mut counts.from_onclick),
        (page.network_urls.as_slice(), &mut counts.from_network),
    ];

    for (raw_urls, counter) in sources {
        for raw in raw_urls {
            if let Some(url) = accept_candidate(raw, homepage, site_root) {
                if seen.insert(url.clone()) {
                    accepted.push(url);
                    *counter += 1;
                }
            }
        }
    }

    accepted.sort();
    accepted.truncate(max_urls);
    (accepted, counts)
}

pub struct RenderFallback<'a> {
    renderer: &'a dyn PageRenderer,
    resolver: &'a dyn Resolver,
    config: &'a AuditConfig,
}

impl<'a> RenderFallback<'a> {
    pub fn new(renderer: &'a dyn PageRenderer, resolver: &'a dyn Resolver, config: &'a AuditConfig) -> Self {
        Self {
            renderer,
            resolver,
            config,
        }
    }

    pub async fn run(&self, homepage: &Url, site_root: &Url) -> RenderOutcome {
        match self.try_run(homepage, site_root).await {
            Ok((candidates, counts)) => {
                tracing::info!(found = candidates.len(), "render fallback finished");
                RenderOutcome::Rendered { candidates, counts }
            }
            Err(err) => {
                tracing::warn!(error = %err, "render fallback degraded");
                RenderOutcome::Degraded {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn try_run(&self, homepage: &Url, site_root: &Url) -> Result<(Vec<String>, HarvestCounts), RenderError> {
        let pinned = check_url(homepage, self.resolver)
            .await
            .map_err(RenderError::UnsafeTarget)?;
        let target = RenderTarget {
            url: homepage.clone(),
            pin: pinned.socket,
        };

        let secs = self.config.render_timeout_secs.max(1);
        let page = tokio::time::timeout(self.config.render_timeout(), self.renderer.render(&target))
            .await
            .map_err(|_| RenderError::Timeout(secs))??;

        Ok(harvest(&page, homepage, site_root, self.config.render_max_urls))
    }
}

/// Renders with a locally installed Chromium through the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    settle: Duration,
    user_agent: String,
}

impl ChromiumRenderer {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.render_settle_ms),
            user_agent: config.user_agent.clone(),
        }
    }

    async fn load(&self, browser: &Browser, target: &RenderTarget) -> Result<RenderedPage, RenderError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let network_urls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        let sink = Arc::clone(&network_urls);
        let listener = tokio::spawn(async move {
            while let Some(event) = requests.next().await {
                if let Ok(mut urls) = sink.lock() {
                    urls.push(event.request.url.clone());
                }
            }
        });

        let loaded = async {
            page.goto(target.url.as_str())
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            tokio::time::sleep(self.settle).await;
            page.content()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))
        }
        .await;

        listener.abort();
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close failed");
        }

        let html = loaded?;
        let network_urls = network_urls.lock().map(|urls| urls.clone()).unwrap_or_default();
        Ok(RenderedPage { html, network_urls })
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, target: &RenderTarget) -> Result<RenderedPage, RenderError> {
        let host = target
            .url
            .host_str()
            .ok_or_else(|| RenderError::Navigation("homepage has no host".into()))?;

        // The audited host maps to the checked address; every other name
        // resolves to nothing, so subresources can never reach a new host
        let resolver_rules = format!(
            "--host-resolver-rules=MAP {} {}, MAP * ~NOTFOUND",
            host,
            target.pin.ip()
        );
        let browser_config = BrowserConfig::builder()
            .no_sandbox()
            .arg(resolver_rules)
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(RenderError::HeadlessUnavailable)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::HeadlessUnavailable(e.to_string()))?;

        // The CDP connection only makes progress while the handler is polled
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.load(&browser, target).await;

        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "browser exit wait failed");
        }
        handler_task.abort();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::resolver::StaticResolver;

    struct FixedRenderer(RenderedPage);

    #[async_trait]
    impl PageRenderer for FixedRenderer {
        async fn render(&self, _target: &RenderTarget) -> Result<RenderedPage, RenderError> {
            Ok(self.0.clone())
        }
    }

    struct MissingBrowser;

    #[async_trait]
    impl PageRenderer for MissingBrowser {
        async fn render(&self, _target: &RenderTarget) -> Result<RenderedPage, RenderError> {
            Err(RenderError::HeadlessUnavailable("chromium not found".into()))
        }
    }

    fn root() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_harvest_sources_filters_and_sorts() {
        let page = RenderedPage {
            html: r#"
                <a href="/zeta">Z</a>
                <a href="https://cdn.other.test/x">X</a>
                <span data-href="/alpha"></span>
                <div onclick="location.href='/menu'"></div>
                <a href="/alpha">dup</a>
            "#
            .into(),
            network_urls: vec![
                "https://example.com/api/data.json".into(),
                "https://example.com/booking".into(),
                "https://example.com/zeta".into(),
            ],
        };
        let (urls, counts) = harvest(&page, &root(), &root(), 50);

        assert_eq!(
            urls,
            vec![
                "https://example.com/alpha",
                "https://example.com/booking",
                "https://example.com/menu",
                "https://example.com/zeta",
            ]
        );
        assert_eq!(counts.from_href, 2);
        assert_eq!(counts.from_data, 0);
        assert_eq!(counts.from_onclick, 1);
        assert_eq!(counts.from_network, 1);
    }

    #[test]
    fn test_harvest_respects_limit() {
        let html: String = (0..10).map(|i| format!(r#"<a href="/p{i}">p</a>"#)).collect();
        let page = RenderedPage { html, network_urls: vec![] };
        let (urls, _) = harvest(&page, &root(), &root(), 3);
        assert_eq!(urls, vec!["https://example.com/p0", "https://example.com/p1", "https://example.com/p2"]);
    }

    #[tokio::test]
    async fn test_missing_browser_degrades() {
        let resolver = StaticResolver::new().with("example.com", &["93.184.216.34"]);
        let config = AuditConfig::default();
        let outcome = RenderFallback::new(&MissingBrowser, &resolver, &config)
            .run(&root(), &root())
            .await;
        assert!(matches!(outcome, RenderOutcome::Degraded { reason } if reason.contains("chromium not found")));
    }

    #[tokio::test]
    async fn test_unsafe_homepage_never_renders() {
        let resolver = StaticResolver::new().with("example.com", &["127.0.0.1"]);
        let config = AuditConfig::default();
        let renderer = FixedRenderer(RenderedPage::default());
        let outcome = RenderFallback::new(&renderer, &resolver, &config)
            .run(&root(), &root())
            .await;
        assert!(matches!(outcome, RenderOutcome::Degraded { reason } if reason.contains("rejected")));
    }
}
