// src/findings/rules.rs
// =============================================================================
// Deterministic rules: signal record in, findings out.
//
// Every rule has a fixed id and is evaluated on its own. The same signal
// record always yields the same findings in the same order:
//   1. robots.txt (site level)
//   2. pages, in URL order, then pages skipped by robots
//   3. off-page canonicals, one finding per distinct target
//   4. sitemaps
//   5. important-page discoverability
//
// Each finding also records how sure we are. Things we saw directly (a
// status code, a parsed rule, a tag) are high/complete. Things inferred from
// an error or from something missing are medium/partial. The policy gate in
// policy.rs later clamps any fail that is not high/complete.
// =============================================================================

use crate::crawl::normalize::same_page;
use crate::crawl::sitemap::SitemapOrigin;
use crate::findings::catalog;
use crate::findings::model::{
    AffectedPage, BlockMatch, BlockedUrl, Evidence, Finding, HtmlTagEvidence, InvalidSitemap, Severity,
    SitemapStatus, SkippedPage,
};
use crate::net::PageFetch;
use crate::signals::{IndexabilitySignals, PageSignals};
use std::collections::BTreeMap;
use url::Url;

// User agents whose robots.txt groups are checked for blocking rules
const MAJOR_AGENTS: [&str; 2] = ["*", "googlebot"];

const REDIRECT_CHAIN_MIN_HOPS: usize = 2;
const REDIRECT_CHAIN_FAIL_ABOVE: usize = 3;
const ROBOTS_SNIPPET_SHORT: usize = 500;

// Pages sharing one off-page canonical target
#[derive(Default)]
struct OffpageGroup {
    href: String,
    affected: Vec<AffectedPage>,
    target_statuses: Vec<Option<u16>>,
}

pub fn evaluate(signals: &IndexabilitySignals) -> Vec<Finding> {
    let mut findings = Vec::new();

    robots_findings(signals, &mut findings);

    let mut offpage: BTreeMap<String, OffpageGroup> = BTreeMap::new();
    let mut skipped: Vec<SkippedPage> = Vec::new();

    for (url, page) in &signals.pages {
        if page.is_robots_skipped() {
            let rule = Url::parse(url)
                .ok()
                .and_then(|u| signals.robots.blocking_rule(&u).map(str::to_string));
            skipped.push(SkippedPage { url: url.clone(), rule });
            continue;
        }
        page_findings(url, page, &mut offpage, &mut findings);
    }

    if !skipped.is_empty() {
        findings.push(
            Finding::new(
                &catalog::PAGES_SKIPPED_BY_ROBOTS,
                Severity::Info,
                Evidence::PageFetch {
                    robots_url: signals.robots.url.clone(),
                    pages: skipped,
                },
            )
            .observed(),
        );
    }

    for (resolved, group) in offpage {
        findings.push(offpage_finding(resolved, group));
    }

    sitemap_findings(signals, &mut findings);
    discoverability_findings(signals, &mut findings);

    tracing::debug!(count = findings.len(), "findings evaluated");
    findings
}

fn robots_findings(signals: &IndexabilitySignals, out: &mut Vec<Finding>) {
    let robots = &signals.robots;
    let snippet = robots.body_snippet.clone().unwrap_or_default();

    let unreachable = robots.error.is_some() || robots.http_status.is_some_and(|s| s >= 400 && s != 404);
    if unreachable {
        out.push(
            Finding::new(
                &catalog::ROBOTS_UNREACHABLE,
                Severity::Fail,
                Evidence::RobotsTxt {
                    url: robots.url.clone(),
                    http_status: robots.http_status,
                    error: robots.error.clone(),
                    snippet: snippet.chars().take(ROBOTS_SNIPPET_SHORT).collect(),
                    parsed_summary: None,
                    robots_block_match: None,
                },
            )
            .observed(),
        );
    }

    if robots.http_status == Some(404) {
        out.push(
            Finding::new(
                &catalog::ROBOTS_MISSING,
                Severity::Info,
                Evidence::RobotsTxt {
                    url: robots.url.clone(),
                    http_status: robots.http_status,
                    error: None,
                    snippet: String::new(),
                    parsed_summary: None,
                    robots_block_match: None,
                },
            )
            .observed(),
        );
    }

    let broad: Vec<&str> = MAJOR_AGENTS
        .into_iter()
        .filter(|ua| robots.rules_for(ua).iter().any(|rule| rule.trim() == "/"))
        .collect();
    if let Some(first) = broad.first() {
        let summary = broad
            .iter()
            .map(|ua| (ua.to_string(), robots.rules_for(ua).to_vec()))
            .collect();
        out.push(
            Finding::new(
                &catalog::ROBOTS_HAS_BROAD_DISALLOW,
                Severity::Fail,
                Evidence::RobotsTxt {
                    url: robots.url.clone(),
                    http_status: robots.http_status,
                    error: None,
                    snippet: snippet.clone(),
                    parsed_summary: Some(summary),
                    robots_block_match: Some(BlockMatch {
                        ua: first.to_string(),
                        rule: "/".to_string(),
                    }),
                },
            )
            .observed(),
        );
    }

    let mut blocked: Vec<BlockedUrl> = Vec::new();
    for ua in MAJOR_AGENTS {
        for url in &signals.important_urls {
            let Ok(parsed) = Url::parse(url) else {
                continue;
            };
            if let Some(rule) = robots.matching_rule(&parsed, ua) {
                blocked.push(BlockedUrl {
                    ua: ua.to_string(),
                    url: url.clone(),
                    rule: rule.to_string(),
                });
            }
        }
    }
    if !blocked.is_empty() {
        let primary_blocked = blocked
            .iter()
            .any(|b| signals.primary_urls.iter().any(|p| same_page(p, &b.url)));
        let severity = if primary_blocked { Severity::Fail } else { Severity::Warning };
        out.push(
            Finding::new(
                &catalog::ROBOTS_BLOCKS_IMPORTANT_PAGES,
                severity,
                Evidence::RobotsBlockMatch {
                    robots_url: robots.url.clone(),
                    robots_http_status: robots.http_status,
                    blocked,
                    robots_snippet: snippet,
                },
            )
            .observed(),
        );
    }
}

fn page_findings(url: &str, page: &PageSignals, offpage: &mut BTreeMap<String, OffpageGroup>, out: &mut Vec<Finding>) {
    let fetch = &page.fetch;
    let important = page.important;
    let escalate = |important: bool| if important { Severity::Fail } else { Severity::Warning };

    // Directives
    if let Some(tag) = page.meta.first_noindex() {
        out.push(
            Finding::new(
                &catalog::NOINDEX_META_PRESENT,
                escalate(important),
                Evidence::HtmlTag(HtmlTagEvidence::MetaNoindex {
                    url: url.to_string(),
                    final_url: fetch.final_url.clone(),
                    http_status: fetch.final_status,
                    snippet: tag.snippet.clone(),
                    attrs: tag.attrs.clone(),
                }),
            )
            .observed(),
        );
    }

    if page.has_noindex_header() {
        let headers_subset = BTreeMap::from([(
            "x-robots-tag".to_string(),
            page.x_robots_tag.clone().unwrap_or_default(),
        )]);
        out.push(
            Finding::new(
                &catalog::NOINDEX_HEADER_PRESENT,
                escalate(important),
                Evidence::ResponseHeaders {
                    url: url.to_string(),
                    final_url: fetch.final_url.clone(),
                    http_status: fetch.final_status,
                    headers_subset,
                },
            )
            .observed(),
        );
    }

    if page.has_conflicting_directives() {
        out.push(
            Finding::new(
                &catalog::NOINDEX_CONFLICTING_DIRECTIVES,
                Severity::Warning,
                Evidence::HtmlTag(HtmlTagEvidence::Directives {
                    url: url.to_string(),
                    final_url: fetch.final_url.clone(),
                    http_status: fetch.final_status,
                    meta_robots: page.meta.robots.clone(),
                    meta_googlebot: page.meta.googlebot.clone(),
                    x_robots_tag: page.x_robots_tag.clone().unwrap_or_default(),
                }),
            )
            .observed(),
        );
    }

    // Canonicals
    let canonical = &page.canonical;
    let canonical_evidence = || {
        Evidence::HtmlTag(HtmlTagEvidence::Canonicals {
            url: url.to_string(),
            final_url: fetch.final_url.clone(),
            http_status: fetch.final_status,
            found_count: canonical.found_count,
            canonicals: canonical.tags.clone(),
        })
    };

    if canonical.found_count == 0 && page.is_html_page() {
        let severity = if important { Severity::Warning } else { Severity::Info };
        out.push(Finding::new(&catalog::CANONICAL_MISSING, severity, canonical_evidence()).inferred());
    }

    if canonical.found_count > 1 {
        out.push(Finding::new(&catalog::CANONICAL_MULTIPLE, Severity::Warning, canonical_evidence()).observed());
    }

    if let (true, Some(href), Some(resolved)) = (canonical.offpage, &canonical.href, &canonical.resolved) {
        let group = offpage.entry(resolved.clone()).or_default();
        group.href = href.clone();
        group.affected.push(AffectedPage {
            url: url.to_string(),
            final_url: fetch.final_url.clone(),
            http_status: fetch.final_status,
            snippet: canonical.tags.first().map(|t| t.snippet.clone()).unwrap_or_default(),
        });
        if let Some(target) = &canonical.target_fetch {
            group.target_statuses.push(target.final_status);
        }
    }

    if let (Some(target), Some(resolved)) = (&canonical.target_fetch, &canonical.resolved) {
        if !target.is_robots_skipped() {
            if target.final_status.is_some_and(|s| s != 200) {
                out.push(
                    Finding::new(&catalog::CANONICAL_NON_200_TARGET, Severity::Fail, chain_evidence(target, resolved, None))
                        .observed(),
                );
            } else if target.error.is_some() {
                out.push(
                    Finding::new(
                        &catalog::CANONICAL_TARGET_UNREACHABLE,
                        Severity::Fail,
                        chain_evidence(target, resolved, None),
                    )
                    .inferred(),
                );
            }
        }
    }

    // Status codes
    let redirect_failure = fetch.redirect_loop || fetch.too_many_redirects;
    if let Some(status) = fetch.final_status.filter(|_| !redirect_failure) {
        if (400..500).contains(&status) {
            out.push(
                Finding::new(&catalog::PAGE_STATUS_4XX, escalate(important), chain_evidence(fetch, url, None)).observed(),
            );
        }
        if (500..600).contains(&status) {
            out.push(Finding::new(&catalog::PAGE_STATUS_5XX, Severity::Fail, chain_evidence(fetch, url, None)).observed());
        }
    }

    // Redirects
    let hops = fetch.redirect_chain.len();
    if hops >= REDIRECT_CHAIN_MIN_HOPS {
        let severity = if hops > REDIRECT_CHAIN_FAIL_ABOVE || important {
            Severity::Fail
        } else {
            Severity::Warning
        };
        out.push(Finding::new(&catalog::REDIRECT_CHAIN, severity, chain_evidence(fetch, url, None)).observed());
    }

    if redirect_failure {
        let reason = if fetch.redirect_loop { "loop" } else { "too_many_redirects" };
        out.push(
            Finding::new(
                &catalog::REDIRECT_LOOP_OR_TOO_MANY,
                Severity::Fail,
                chain_evidence(fetch, url, Some(reason)),
            )
            .observed(),
        );
    } else if fetch.error.is_some() {
        out.push(
            Finding::new(&catalog::PAGE_UNREACHABLE, escalate(important), chain_evidence(fetch, url, None)).inferred(),
        );
    }
}

fn offpage_finding(resolved: String, group: OffpageGroup) -> Finding {
    let validated = group.target_statuses.contains(&Some(200));
    let finding = Finding::new(
        &catalog::CANONICAL_POINTS_OFFPAGE,
        Severity::Fail,
        Evidence::HtmlTag(HtmlTagEvidence::CanonicalOffpage {
            canonical_href: group.href,
            canonical_resolved: resolved,
            affected_pages: group.affected,
            target_status: group.target_statuses.first().copied().flatten(),
        }),
    );
    // Only a target that answered 200 proves the canonical is a real page
    if validated {
        finding.observed()
    } else {
        finding.inferred()
    }
}

fn sitemap_findings(signals: &IndexabilitySignals, out: &mut Vec<Finding>) {
    let sitemaps = &signals.sitemaps;
    let robots_snippet = signals.robots.body_snippet.clone().unwrap_or_default();

    let probe_ok = sitemaps
        .entries
        .iter()
        .any(|e| e.origin == SitemapOrigin::Probed && e.status == Some(200));
    if sitemaps.declared.is_empty() && !probe_ok {
        let probed = sitemaps
            .probed
            .iter()
            .map(|url| {
                let entry = sitemaps.entry(url);
                SitemapStatus {
                    url: url.clone(),
                    status: entry.and_then(|e| e.status),
                    error: entry.and_then(|e| e.error.clone()),
                }
            })
            .collect();
        out.push(
            Finding::new(
                &catalog::SITEMAP_MISSING,
                Severity::Info,
                Evidence::SitemapFetch {
                    declared: Vec::new(),
                    probed,
                    robots_snippet: robots_snippet.clone(),
                },
            )
            .inferred(),
        );
    }

    let unreachable: Vec<SitemapStatus> = sitemaps
        .entries
        .iter()
        .filter(|e| e.origin == SitemapOrigin::Declared)
        .filter(|e| e.error.is_some() || e.status.is_some_and(|s| s >= 400))
        .map(|e| SitemapStatus {
            url: e.url.clone(),
            status: e.status,
            error: e.error.clone(),
        })
        .collect();
    if !unreachable.is_empty() {
        let all_have_status = unreachable.iter().all(|s| s.status.is_some());
        let finding = Finding::new(
            &catalog::SITEMAP_DECLARED_BUT_UNREACHABLE,
            Severity::Warning,
            Evidence::SitemapFetch {
                declared: unreachable,
                probed: Vec::new(),
                robots_snippet,
            },
        );
        out.push(if all_have_status { finding.observed() } else { finding.inferred() });
    }

    let invalid: Vec<InvalidSitemap> = sitemaps
        .entries
        .iter()
        .filter(|e| e.status == Some(200))
        .filter_map(|e| {
            e.parse_error.as_ref().map(|parse_error| InvalidSitemap {
                url: e.url.clone(),
                status: e.status,
                parse_error: parse_error.clone(),
                body_snippet: e.body_snippet.clone(),
            })
        })
        .collect();
    if !invalid.is_empty() {
        out.push(
            Finding::new(
                &catalog::SITEMAP_INVALID_XML,
                Severity::Warning,
                Evidence::SitemapParse { invalid },
            )
            .observed(),
        );
    }

    let failing: Vec<_> = sitemaps.sample.results.iter().filter(|r| r.is_failure()).collect();
    if !failing.is_empty() {
        let important_failed = failing
            .iter()
            .any(|r| signals.important_urls.iter().any(|u| same_page(u, &r.url)));
        let any_status = failing.iter().any(|r| r.status.is_some_and(|s| s >= 400));
        let finding = Finding::new(
            &catalog::SITEMAP_URLS_UNREACHABLE_SAMPLE,
            if important_failed { Severity::Fail } else { Severity::Warning },
            Evidence::SitemapSampleResult {
                strategy: sitemaps.sample.strategy.to_string(),
                n: sitemaps.sample.n,
                failing_count: failing.len(),
                sample: sitemaps.sample.results.clone(),
            },
        );
        out.push(if any_status { finding.observed() } else { finding.inferred() });
    }
}

fn discoverability_findings(signals: &IndexabilitySignals, out: &mut Vec<Finding>) {
    let in_sitemap = |url: &str| signals.sitemaps.listed_urls().any(|u| same_page(u, url));
    let on_homepage = |url: &str| signals.homepage_links.iter().any(|u| same_page(u, url));

    for url in &signals.important_urls {
        if same_page(url, &signals.homepage_final_url) {
            continue;
        }
        let found_in_homepage_links = on_homepage(url);
        let found_in_sitemap = in_sitemap(url);
        if found_in_homepage_links || found_in_sitemap {
            continue;
        }

        let primary = signals.primary_urls.iter().any(|p| same_page(p, url));
        out.push(
            Finding::new(
                &catalog::IMPORTANT_PAGE_NOT_DISCOVERABLE,
                if primary { Severity::Fail } else { Severity::Warning },
                Evidence::Discoverability {
                    page_url: url.clone(),
                    found_in_homepage_links,
                    found_in_sitemap,
                    checked_sources: vec!["homepage_links".to_string(), "sitemap_urls".to_string()],
                },
            )
            .inferred(),
        );
    }
}

fn chain_evidence(fetch: &PageFetch, requested: &str, reason: Option<&str>) -> Evidence {
    Evidence::HttpRedirectChain {
        url: requested.to_string(),
        final_url: fetch.final_url.clone(),
        final_status: fetch.final_status,
        redirect_chain: fetch.redirect_chain.clone(),
        error: fetch.error.clone(),
        reason: reason.map(str::to_string),
    }
}
