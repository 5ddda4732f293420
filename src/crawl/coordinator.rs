// src/crawl/coordinator.rs
// =============================================================================
// Runs discovery end to end and owns the merge.
//
// Order of work:
// 1. robots.txt -> RobotsPolicy
// 2. Sitemaps -> candidates
// 3. BFS from the homepage -> candidates
// 4. PageInventory picks the analyzed set; each page is fetched (or
//    skipped because robots disallows it)
// 5. In extended mode, if too few HTML pages were analyzed, the render
//    fallback runs and the inventory is re-selected with its URLs
//
// Every source hands back its own candidate list. Only this module appends
// to `discovered`, so the hard cap and first-seen dedup live in one place.
// =============================================================================

use crate::config::{AnalysisMode, AuditConfig};
use crate::crawl::inventory::PageInventory;
use crate::crawl::pages::PageFetcher;
use crate::crawl::queue::{BfsOutcome, LinkDiscoveryEngine};
use crate::crawl::render::{HarvestCounts, PageRenderer, RenderFallback, RenderOutcome};
use crate::crawl::robots::{RobotsDecision, RobotsPolicy};
use crate::crawl::sitemap::{SitemapDiscovery, SitemapResolver};
use crate::error::FetchError;
use crate::net::{GuardedHttpClient, PageFetch};
use crate::signals::html;
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// One analyzed page as it appears in the crawl record.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlPage {
    pub url: String,
    pub status: Option<u16>,
    pub final_url: Option<String>,
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub error: Option<String>,
    /// The robots rule that kept the page from being fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots_rule: Option<String>,
}

impl CrawlPage {
    fn fetched(url: &str, page: &PageFetch) -> Self {
        let title = if page.is_html() { html::title(&page.body) } else { None };
        Self {
            url: url.to_string(),
            status: page.final_status,
            final_url: Some(page.final_url.clone()),
            title,
            content_type: page.content_type.clone(),
            error: page.error.clone(),
            robots_rule: None,
        }
    }

    fn skipped(url: &str, err: &FetchError) -> Self {
        let rule = match err {
            FetchError::RobotsDisallowed(rule) => Some(rule.clone()),
            _ => None,
        };
        Self {
            url: url.to_string(),
            status: None,
            final_url: None,
            title: None,
            content_type: None,
            error: Some(err.code().to_string()),
            robots_rule: rule,
        }
    }

    // An analyzed page counts as HTML when it was fetched without error and
    // did not declare a non-HTML content type
    pub fn is_html(&self) -> bool {
        if self.error.is_some() || self.status.is_none() {
            return false;
        }
        match &self.content_type {
            Some(ct) => ct.to_ascii_lowercase().contains("text/html"),
            None => true,
        }
    }

    pub fn is_robots_skipped(&self) -> bool {
        self.error.as_deref() == Some("robots_disallowed")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotsSource {
    pub url: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SitemapFetchSummary {
    pub url: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SitemapSource {
    pub declared: Vec<String>,
    pub probed: Vec<String>,
    pub fetched: Vec<SitemapFetchSummary>,
    pub urls_added: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaywrightSource {
    pub used: bool,
    pub urls_added: usize,
    pub error: String,
    #[serde(flatten)]
    pub counts: HarvestCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlSources {
    pub robots: RobotsSource,
    pub sitemaps: SitemapSource,
    pub bfs: BfsOutcome,
    pub playwright: PlaywrightSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotsSummary {
    pub url: String,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub policy: RobotsDecision,
    pub reason: String,
}

/// The `crawl` section of the audit report.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlRecord {
    pub analysis_mode: AnalysisMode,
    pub discovered_count: usize,
    pub discovered_urls: Vec<String>,
    pub analyzed_count: usize,
    pub analyzed_urls: Vec<String>,
    pub pages: Vec<CrawlPage>,
    pub sources: CrawlSources,
    pub robots: RobotsSummary,
    pub playwright_attempted: bool,
    pub used_playwright: bool,
    pub playwright_reason: Option<String>,
    pub fallback_triggered: bool,
    pub fallback_threshold: usize,
}

/// Everything later stages need from discovery.
pub struct CrawlRun {
    pub record: CrawlRecord,
    pub robots: RobotsPolicy,
    pub sitemaps: SitemapDiscovery,
}

// The discovered list plus its dedup set; the only place URLs are appended
struct Discovered {
    urls: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl Discovered {
    fn new(cap: usize) -> Self {
        Self {
            urls: Vec::new(),
            seen: HashSet::new(),
            cap,
        }
    }

    // Appends unseen URLs until the cap; returns how many were added
    fn merge<'u>(&mut self, candidates: impl IntoIterator<Item = &'u String>) -> usize {
        let mut added = 0;
        for url in candidates {
            if self.urls.len() >= self.cap {
                break;
            }
            if self.seen.insert(url.clone()) {
                self.urls.push(url.clone());
                added += 1;
            }
        }
        added
    }
}

pub struct CrawlCoordinator<'a> {
    config: &'a AuditConfig,
    client: &'a GuardedHttpClient,
    renderer: Option<&'a dyn PageRenderer>,
}

impl<'a> CrawlCoordinator<'a> {
    pub fn new(config: &'a AuditConfig, client: &'a GuardedHttpClient, renderer: Option<&'a dyn PageRenderer>) -> Self {
        Self {
            config,
            client,
            renderer,
        }
    }

    pub async fn run(&self, homepage: &Url, site_root: &Url, pages: &mut PageFetcher<'_>) -> CrawlRun {
        let robots = RobotsPolicy::build(self.client, site_root, self.config).await;

        let mut discovered = Discovered::new(self.config.hard_cap_discovered);
        discovered.merge([&homepage.to_string()]);

        // Sitemaps
        let sitemaps = SitemapResolver::new(self.client, self.config)
            .discover(site_root, &robots)
            .await;
        let sitemap_added = discovered.merge(&sitemaps.candidates);

        // BFS
        let bfs = LinkDiscoveryEngine::new(self.config)
            .discover(homepage, site_root, &robots, pages, &discovered.seen)
            .await;
        discovered.merge(&bfs.candidates);

        // Analyzed set
        let mut analyzed = self.select(&discovered.urls, site_root);
        let mut page_records = self.fetch_pages(&analyzed, &robots, pages).await;
        let html_count = count_html(&page_records);

        let mut playwright = PlaywrightSource::default();
        let mut playwright_attempted = false;
        let mut used_playwright = false;
        let mut playwright_reason = None;
        let fallback_triggered =
            self.config.analysis_mode == AnalysisMode::Extended && html_count < self.config.fallback_threshold;

        if fallback_triggered {
            tracing::info!(
                html_count,
                threshold = self.config.fallback_threshold,
                "static discovery below threshold, trying render fallback"
            );
            playwright_attempted = true;

            match self.render(homepage, site_root).await {
                RenderOutcome::Rendered { candidates, counts } => {
                    playwright.counts = counts;
                    let added = discovered.merge(&candidates);
                    playwright.urls_added = added;
                    playwright.used = true;
                    used_playwright = added > 0;
                    if added == 0 {
                        playwright_reason = Some("no_new_urls".to_string());
                    }
                }
                RenderOutcome::Degraded { reason } => {
                    playwright.error = reason.clone();
                    playwright_reason = Some(reason);
                }
            }

            if used_playwright {
                analyzed = self.select(&discovered.urls, site_root);
                let known: HashSet<&str> = page_records.iter().map(|p| p.url.as_str()).collect();
                let additional: Vec<String> = analyzed
                    .iter()
                    .filter(|url| !known.contains(url.as_str()))
                    .cloned()
                    .collect();
                let extra = self.fetch_pages(&additional, &robots, pages).await;
                page_records.extend(extra);
            }
        }

        // Pages re-selected away by the second pass are not reported
        page_records.retain(|p| analyzed.contains(&p.url));
        let analyzed_count = count_html(&page_records);

        let record = CrawlRecord {
            analysis_mode: self.config.analysis_mode,
            discovered_count: discovered.urls.len(),
            analyzed_count,
            analyzed_urls: analyzed,
            pages: page_records,
            sources: CrawlSources {
                robots: RobotsSource {
                    url: robots.url.clone(),
                    status: robots.http_status,
                },
                sitemaps: SitemapSource {
                    declared: sitemaps.declared.clone(),
                    probed: sitemaps.probed.clone(),
                    fetched: sitemaps
                        .entries
                        .iter()
                        .map(|e| SitemapFetchSummary {
                            url: e.url.clone(),
                            status: e.status,
                        })
                        .collect(),
                    urls_added: sitemap_added,
                },
                bfs,
                playwright,
            },
            robots: RobotsSummary {
                url: robots.url.clone(),
                http_status: robots.http_status,
                error: robots.error.clone(),
                policy: robots.decision,
                reason: robots.reason.clone(),
            },
            discovered_urls: discovered.urls,
            playwright_attempted,
            used_playwright,
            playwright_reason,
            fallback_triggered,
            fallback_threshold: self.config.fallback_threshold,
        };

        CrawlRun {
            record,
            robots,
            sitemaps,
        }
    }

    fn select(&self, discovered: &[String], site_root: &Url) -> Vec<String> {
        PageInventory::select(
            discovered,
            site_root.as_str(),
            self.config.max_pages,
            self.config.hard_cap_analyzed,
        )
    }

    async fn fetch_pages(&self, urls: &[String], robots: &RobotsPolicy, pages: &mut PageFetcher<'_>) -> Vec<CrawlPage> {
        let mut records = Vec::with_capacity(urls.len());
        for url in urls {
            match pages.fetch_allowed(url, robots).await {
                Ok(page) => records.push(CrawlPage::fetched(url, page)),
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "page skipped");
                    records.push(CrawlPage::skipped(url, &err));
                }
            }
        }
        records
    }

    async fn render(&self, homepage: &Url, site_root: &Url) -> RenderOutcome {
        match self.renderer {
            Some(renderer) => {
                RenderFallback::new(renderer, self.client.resolver(), self.config)
                    .run(homepage, site_root)
                    .await
            }
            None => RenderOutcome::Degraded {
                reason: "headless browser disabled".to_string(),
            },
        }
    }
}

fn count_html(pages: &[CrawlPage]) -> usize {
    pages.iter().filter(|p| p.is_html()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovered_merge_caps_and_dedups() {
        let mut discovered = Discovered::new(3);
        let first = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(discovered.merge(&first), 2);
        let second = vec!["b".to_string(), "c".to_string(), "d".to_string()];
        assert_eq!(discovered.merge(&second), 1);
        assert_eq!(discovered.urls, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_crawl_page_html_detection() {
        let ok = CrawlPage {
            url: "https://e.test/".into(),
            status: Some(404),
            final_url: None,
            title: None,
            content_type: Some("text/html".into()),
            error: None,
            robots_rule: None,
        };
        assert!(ok.is_html());

        let skipped = CrawlPage::skipped("https://e.test/x", &FetchError::RobotsDisallowed("/x".into()));
        assert!(!skipped.is_html());
        assert!(skipped.is_robots_skipped());
        assert_eq!(skipped.robots_rule.as_deref(), Some("/x"));
    }
}
