// src/signals/extract.rs
// =============================================================================
// Per-page indexability signals and the site-wide signal record.
//
// For every analyzed page (plus important pages the crawl did not pick) we
// keep:
// - the traced fetch: redirect hops, final URL/status, loop/overflow flags
// - <meta name="robots|googlebot"> tags and the X-Robots-Tag header
// - every canonical link, resolved against the final URL
// - for an off-page canonical, one fetch of the canonical target
//
// All fetches go through the run's PageFetcher, so pages BFS already pulled
// are not requested again. Nothing here decides severity; that is the job
// of the findings rules.
// =============================================================================

use crate::config::AuditConfig;
use crate::crawl::normalize::{normalize_url, same_host, same_page};
use crate::crawl::sitemap::{self, SitemapDiscovery, SitemapEntry};
use crate::crawl::{CrawlRun, PageFetcher, RobotsPolicy};
use crate::error::FetchError;
use crate::net::PageFetch;
use crate::signals::html::{anchors, canonical_links, meta_robots, MetaRobotsTag};
use crate::signals::important::ImportantPages;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

const SAMPLE_STRATEGY: &str = "first-N-in-document-order";

// Lower-cased directive tokens; commas, semicolons and whitespace all separate
pub fn directive_tokens(value: &str) -> Vec<String> {
    value
        .to_lowercase()
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn has_directive(value: &str, token: &str) -> bool {
    directive_tokens(value).iter().any(|t| t == token)
}

/// Robots meta tags split by their name attribute.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetaDirectives {
    pub robots: Vec<MetaRobotsTag>,
    pub googlebot: Vec<MetaRobotsTag>,
}

impl MetaDirectives {
    fn from_tags(tags: Vec<MetaRobotsTag>) -> Self {
        let (googlebot, robots): (Vec<_>, Vec<_>) = tags.into_iter().partition(|t| t.name == "googlebot");
        Self { robots, googlebot }
    }

    pub fn tags(&self) -> impl Iterator<Item = &MetaRobotsTag> {
        self.robots.iter().chain(&self.googlebot)
    }

    pub fn first_noindex(&self) -> Option<&MetaRobotsTag> {
        self.tags().find(|t| has_directive(&t.content, "noindex"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalTag {
    pub href: String,
    /// None when the href is empty or cannot be resolved
    pub resolved: Option<String>,
    pub snippet: String,
}

/// Canonical links of one page. `href`/`resolved` describe the first tag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanonicalSignal {
    pub found_count: usize,
    pub tags: Vec<CanonicalTag>,
    pub href: Option<String>,
    pub resolved: Option<String>,
    pub offpage: bool,
    /// Fetch of the canonical target; only for off-page canonicals
    pub target_fetch: Option<PageFetch>,
}

impl CanonicalSignal {
    fn from_html(html: &str, final_url: &str) -> Self {
        let base = Url::parse(final_url).ok();
        let tags: Vec<CanonicalTag> = canonical_links(html)
            .into_iter()
            .map(|link| {
                let resolved = match (&base, link.href.is_empty()) {
                    (Some(base), false) => base.join(&link.href).ok().map(String::from),
                    _ => None,
                };
                CanonicalTag {
                    href: link.href,
                    resolved,
                    snippet: link.snippet,
                }
            })
            .collect();

        let first = tags.first();
        let href = first.map(|t| t.href.clone()).filter(|h| !h.is_empty());
        let resolved = first.and_then(|t| t.resolved.clone());
        let offpage = href.is_some() && resolved.as_deref().is_some_and(|r| !same_page(final_url, r));

        Self {
            found_count: tags.len(),
            href,
            resolved,
            offpage,
            tags,
            target_fetch: None,
        }
    }
}

/// Everything observed about one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSignals {
    pub url: String,
    pub fetch: PageFetch,
    pub x_robots_tag: Option<String>,
    pub meta: MetaDirectives,
    pub canonical: CanonicalSignal,
    pub important: bool,
    pub primary: bool,
}

impl PageSignals {
    // A page robots.txt kept us from fetching
    fn skipped(url: &str, err: &FetchError) -> Self {
        Self {
            url: url.to_string(),
            fetch: PageFetch::not_attempted(url, err),
            x_robots_tag: None,
            meta: MetaDirectives::default(),
            canonical: CanonicalSignal::default(),
            important: false,
            primary: false,
        }
    }

    pub fn is_robots_skipped(&self) -> bool {
        self.fetch.is_robots_skipped()
    }

    // Fetched with 200 and HTML content
    pub fn is_html_page(&self) -> bool {
        self.fetch.is_ok() && self.fetch.is_html()
    }

    pub fn has_noindex_header(&self) -> bool {
        self.x_robots_tag
            .as_deref()
            .is_some_and(|v| has_directive(v, "noindex"))
    }

    // Both `index` and `noindex` appear across meta tags and the header
    pub fn has_conflicting_directives(&self) -> bool {
        let values = self
            .meta
            .tags()
            .map(|t| t.content.as_str())
            .chain(self.x_robots_tag.as_deref());
        let (mut index, mut noindex) = (false, false);
        for value in values {
            index |= has_directive(value, "index");
            noindex |= has_directive(value, "noindex");
        }
        index && noindex
    }
}

/// One sampled sitemap URL and how its fetch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleResult {
    pub url: String,
    pub status: Option<u16>,
    pub final_url: Option<String>,
    pub error: Option<String>,
}

impl SampleResult {
    // Robots-skipped samples say nothing about reachability
    pub fn is_failure(&self) -> bool {
        if self.error.as_deref() == Some("robots_disallowed") {
            return false;
        }
        self.error.is_some() || self.status.is_some_and(|s| s >= 400)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SitemapSample {
    pub strategy: &'static str,
    pub n: usize,
    pub results: Vec<SampleResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SitemapSignals {
    pub declared: Vec<String>,
    pub probed: Vec<String>,
    pub entries: Vec<SitemapEntry>,
    pub sample: SitemapSample,
}

impl SitemapSignals {
    pub fn entry(&self, url: &str) -> Option<&SitemapEntry> {
        self.entries.iter().find(|e| e.url == url)
    }

    // Every loc listed by a parsed urlset
    pub fn listed_urls(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().filter(|e| e.is_urlset()).flat_map(|e| &e.urls)
    }
}

/// The site-wide signal record findings are evaluated against.
#[derive(Debug, Clone, Serialize)]
pub struct IndexabilitySignals {
    pub site_root: String,
    pub homepage_final_url: String,
    pub important_urls: Vec<String>,
    pub important_url_groups: ImportantPages,
    pub primary_urls: Vec<String>,
    pub robots: RobotsPolicy,
    /// Keyed by the URL as requested
    pub pages: BTreeMap<String, PageSignals>,
    pub sitemaps: SitemapSignals,
    /// Same-host links found on the homepage, normalized, first-seen order
    pub homepage_links: Vec<String>,
}

pub struct IndexabilitySignalExtractor<'a> {
    config: &'a AuditConfig,
    robots: &'a RobotsPolicy,
}

impl<'a> IndexabilitySignalExtractor<'a> {
    pub fn new(config: &'a AuditConfig, robots: &'a RobotsPolicy) -> Self {
        Self { config, robots }
    }

    pub async fn extract(&self, url: &str, pages: &mut PageFetcher<'_>) -> PageSignals {
        let fetch = match pages.fetch_allowed(url, self.robots).await {
            Ok(page) => page.clone(),
            Err(err) => return PageSignals::skipped(url, &err),
        };

        let html = if fetch.is_html() { fetch.body.as_str() } else { "" };
        let meta = MetaDirectives::from_tags(meta_robots(html));
        let mut canonical = CanonicalSignal::from_html(html, &fetch.final_url);

        if canonical.offpage {
            if let Some(target) = canonical.resolved.clone() {
                tracing::debug!(page = url, canonical = %target, "fetching off-page canonical target");
                let target_fetch = match pages.fetch_allowed(&target, self.robots).await {
                    Ok(page) => page.clone(),
                    Err(err) => PageFetch::not_attempted(&target, &err),
                };
                canonical.target_fetch = Some(target_fetch);
            }
        }

        PageSignals {
            url: url.to_string(),
            x_robots_tag: fetch.headers.get("x-robots-tag").cloned(),
            meta,
            canonical,
            fetch,
            important: false,
            primary: false,
        }
    }

    // Builds the full record for a finished crawl
    pub async fn collect(
        &self,
        homepage: &Url,
        site_root: &Url,
        crawl: &CrawlRun,
        pages: &mut PageFetcher<'_>,
    ) -> IndexabilitySignals {
        // The homepage was fetched before robots.txt was read; this is a memo hit
        let page = pages.fetch(homepage.as_str()).await;
        let homepage_final = Url::parse(&page.final_url).unwrap_or_else(|_| homepage.clone());
        let homepage_html = if page.is_html() { page.body.clone() } else { String::new() };

        let important = ImportantPages::from_homepage(&homepage_final, &homepage_html);
        let homepage_links = homepage_links(&homepage_final, &homepage_html);

        let mut targets: Vec<String> = crawl.record.analyzed_urls.clone();
        for url in important.urls() {
            if !targets.iter().any(|t| same_page(t, &url)) {
                targets.push(url);
            }
        }

        let mut page_signals = BTreeMap::new();
        for url in targets {
            let mut page = self.extract(&url, pages).await;
            let final_url = page.fetch.final_url.clone();
            page.important = important.is_important(&url) || important.is_important(&final_url);
            page.primary = important.is_primary(&url) || important.is_primary(&final_url);
            page_signals.insert(url, page);
        }

        let sitemaps = self.sitemap_signals(&crawl.sitemaps, pages).await;

        tracing::info!(
            pages = page_signals.len(),
            important = important.urls().len(),
            sampled = sitemaps.sample.results.len(),
            "indexability signals collected"
        );

        IndexabilitySignals {
            site_root: site_root.to_string(),
            homepage_final_url: homepage_final.to_string(),
            important_urls: important.urls(),
            primary_urls: important.primary(),
            important_url_groups: important,
            robots: crawl.robots.clone(),
            pages: page_signals,
            sitemaps,
            homepage_links,
        }
    }

    async fn sitemap_signals(&self, discovery: &SitemapDiscovery, pages: &mut PageFetcher<'_>) -> SitemapSignals {
        let n = self.config.sitemap_sample_size;
        let mut results = Vec::new();

        for url in sitemap::sample(&discovery.entries, n) {
            let result = match pages.fetch_allowed(&url, self.robots).await {
                Ok(page) => SampleResult {
                    status: page.final_status,
                    final_url: Some(page.final_url.clone()),
                    error: page.error.clone(),
                    url,
                },
                Err(err) => SampleResult {
                    url,
                    status: None,
                    final_url: None,
                    error: Some(err.code().to_string()),
                },
            };
            results.push(result);
        }

        SitemapSignals {
            declared: discovery.declared.clone(),
            probed: discovery.probed.clone(),
            entries: discovery.entries.clone(),
            sample: SitemapSample {
                strategy: SAMPLE_STRATEGY,
                n,
                results,
            },
        }
    }
}

fn homepage_links(homepage: &Url, html: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for anchor in anchors(html) {
        let Some(url) = normalize_url(&anchor.href, homepage) else {
            continue;
        };
        if !same_host(&url, homepage) {
            continue;
        }
        let url = String::from(url);
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}
