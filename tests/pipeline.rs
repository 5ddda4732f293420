// tests/pipeline.rs
// Full audits against an in-memory site. No sockets are opened.

mod common;

use common::{client, html, redirect, resolver, text, xml, MapTransport};
use indexguard::findings::model::HtmlTagEvidence;
use indexguard::findings::{Confidence, Evidence, Finding, PolicyAction, ProofCompleteness, Severity};
use indexguard::{AuditConfig, AuditError, Auditor, FetchError};
use std::collections::HashSet;
use std::sync::Arc;

const HOME: &str = "https://example.com/";
const ROBOTS: &str = "https://example.com/robots.txt";

fn config() -> AuditConfig {
    AuditConfig {
        max_pages: 10,
        ..AuditConfig::default()
    }
}

fn auditor(transport: &Arc<MapTransport>, hosts: &[&str]) -> Auditor {
    Auditor::with_client(config(), client(transport.clone(), resolver(hosts)))
}

fn with_id<'a>(findings: &'a [Finding], id: &str) -> Vec<&'a Finding> {
    findings.iter().filter(|f| f.id == id).collect()
}

fn page(canonical: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
        .collect();
    format!(
        r#"<html><head><title>Salon</title><link rel="canonical" href="{canonical}"></head><body>{anchors}</body></html>"#
    )
}

#[tokio::test]
async fn test_broad_disallow_is_a_fail() {
    let transport = Arc::new(
        MapTransport::new()
            .page(HOME, html(&page(HOME, &["/despre"])))
            .page(ROBOTS, text(200, "User-agent: *\nDisallow: /\n")),
    );

    let report = auditor(&transport, &["example.com"]).run("example.com").await.unwrap();

    let broad = with_id(&report.findings, "IDX_ROBOTS_HAS_BROAD_DISALLOW");
    assert_eq!(broad.len(), 1);
    assert_eq!(broad[0].severity, Severity::Fail);
    assert_eq!(broad[0].confidence_level, Some(Confidence::High));

    // The homepage itself is important and blocked for every agent
    let blocked = with_id(&report.findings, "IDX_ROBOTS_BLOCKS_IMPORTANT_PAGES");
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].severity, Severity::Fail);

    assert_eq!(with_id(&report.findings, "IDX_PAGES_SKIPPED_BY_ROBOTS").len(), 1);
    assert!(report.has_failures());
    // Only the homepage, robots.txt and the two sitemap probes went out
    assert_eq!(transport.requests_for("https://example.com/despre"), 0);
}

#[tokio::test]
async fn test_offpage_canonicals_are_consolidated() {
    let transport = Arc::new(
        MapTransport::new()
            .page(HOME, html(&page(HOME, &["/ro/", "/ro/contact"])))
            .page("https://example.com/ro/", html(&page(HOME, &["/ro/contact"])))
            .page("https://example.com/ro/contact", html(&page(HOME, &["/ro/"])))
            .page(ROBOTS, text(200, "User-agent: *\nDisallow: /admin\n")),
    );

    let report = auditor(&transport, &["example.com"]).run(HOME).await.unwrap();

    let offpage = with_id(&report.findings, "IDX_CANONICAL_POINTS_OFFPAGE");
    assert_eq!(offpage.len(), 1);
    let finding = offpage[0];
    assert_eq!(finding.severity, Severity::Fail);
    assert_eq!(finding.confidence_level, Some(Confidence::High));
    assert_eq!(finding.proof_completeness, Some(ProofCompleteness::Complete));

    match &finding.evidence {
        Evidence::HtmlTag(HtmlTagEvidence::CanonicalOffpage {
            canonical_resolved,
            affected_pages,
            target_status,
            ..
        }) => {
            assert_eq!(canonical_resolved, HOME);
            assert_eq!(affected_pages.len(), 2);
            assert_eq!(*target_status, Some(200));
        }
        other => panic!("unexpected evidence {other:?}"),
    }

    // The canonical target is the homepage, already fetched
    assert_eq!(transport.requests_for(HOME), 1);
}

#[tokio::test]
async fn test_missing_sitemap_reported_once_as_info() {
    let transport = Arc::new(
        MapTransport::new()
            .page(HOME, html(&page(HOME, &["/servicii"])))
            .page("https://example.com/servicii", html(&page("https://example.com/servicii", &["/"])))
            .page(ROBOTS, text(200, "User-agent: *\nDisallow: /admin\n")),
    );

    let report = auditor(&transport, &["example.com"]).run(HOME).await.unwrap();

    let missing = with_id(&report.findings, "IDX_SITEMAP_MISSING");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].severity, Severity::Info);
    assert!(with_id(&report.findings, "IDX_SITEMAP_DECLARED_BUT_UNREACHABLE").is_empty());

    // Both well-known locations were probed
    assert_eq!(transport.requests_for("https://example.com/sitemap.xml"), 1);
    assert_eq!(transport.requests_for("https://example.com/sitemap_index.xml"), 1);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_unsafe_homepage_aborts_before_any_request() {
    let transport = Arc::new(MapTransport::new());
    let auditor = Auditor::with_client(
        config(),
        client(transport.clone(), common::resolver(&[]).with("intranet.test", &["10.0.0.8"])),
    );

    let result = auditor.run("http://intranet.test/").await;
    assert!(matches!(
        result,
        Err(AuditError::UnsafeHomepage(FetchError::UnsafeTarget { .. }))
    ));

    let result = auditor.run("http://127.0.0.1:8080/").await;
    assert!(matches!(result, Err(AuditError::UnsafeHomepage(_))));

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_dns_failure_aborts_the_audit() {
    let transport = Arc::new(MapTransport::new());
    let result = auditor(&transport, &[]).run("https://nowhere.test/").await;

    assert!(matches!(
        result,
        Err(AuditError::UnsafeHomepage(FetchError::DnsResolutionFailed(_)))
    ));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_inferred_fail_is_clamped_to_warning() {
    // The contact page redirects to a host that does not resolve
    let transport = Arc::new(
        MapTransport::new()
            .page(HOME, html(&page(HOME, &["/contact"])))
            .page("https://example.com/contact", redirect(301, "https://gone.test/contact"))
            .page(ROBOTS, text(200, "User-agent: *\nDisallow: /admin\n")),
    );

    let report = auditor(&transport, &["example.com"]).run(HOME).await.unwrap();

    let unreachable = with_id(&report.findings, "IDX_PAGE_UNREACHABLE");
    assert_eq!(unreachable.len(), 1);
    let finding = unreachable[0];
    assert_eq!(finding.severity, Severity::Warning);
    assert_eq!(finding.confidence_level, Some(Confidence::Medium));
    assert_eq!(finding.policy_notes.len(), 1);
    assert!(matches!(
        finding.policy_actions.as_slice(),
        [PolicyAction::SeverityClamp {
            from: Severity::Fail,
            to: Severity::Warning,
            reason,
            ..
        }] if reason == "confidence_proof_gate"
    ));

    // Every remaining fail carries full proof
    for f in report.findings.iter().filter(|f| f.severity == Severity::Fail) {
        assert_eq!(f.confidence_level, Some(Confidence::High));
        assert_eq!(f.proof_completeness, Some(ProofCompleteness::Complete));
    }
}

#[tokio::test]
async fn test_every_url_is_requested_at_most_once() {
    // Sitemap locs spelled differently from the links BFS follows
    let sitemap = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com</loc></url>
  <url><loc>https://EXAMPLE.com/despre</loc></url>
  <url><loc>https://example.com:443/servicii#preturi</loc></url>
  <url><loc>https://example.com/contact</loc></url>
</urlset>"#;

    let transport = Arc::new(
        MapTransport::new()
            .page(HOME, html(&page(HOME, &["/despre", "/contact#formular", "/programari", "https://Example.com/"])))
            .page("https://example.com/despre", html(&page("https://example.com/despre", &["/"])))
            .page("https://example.com/contact", html(&page("https://example.com/contact", &["/"])))
            .page("https://example.com/programari", html(&page("https://example.com/programari", &["/"])))
            .page("https://example.com/servicii", html(&page("https://example.com/servicii", &["/"])))
            .page(
                ROBOTS,
                text(200, "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\n"),
            )
            .page("https://example.com/sitemap.xml", xml(sitemap)),
    );

    let report = auditor(&transport, &["example.com"]).run(HOME).await.unwrap();

    let requested = transport.requested();
    let unique: HashSet<&String> = requested.iter().collect();
    assert_eq!(requested.len(), unique.len(), "duplicate requests: {requested:?}");
    for url in [
        HOME,
        "https://example.com/despre",
        "https://example.com/contact",
        "https://example.com/servicii",
    ] {
        assert_eq!(transport.requests_for(url), 1, "{url}");
    }

    // Declared sitemaps suppress the probes
    assert_eq!(transport.requests_for("https://example.com/sitemap_index.xml"), 0);
    assert!(with_id(&report.findings, "IDX_SITEMAP_MISSING").is_empty());
    assert!(with_id(&report.findings, "IDX_SITEMAP_URLS_UNREACHABLE_SAMPLE").is_empty());

    assert_eq!(report.crawl.analyzed_count, 5);
    assert!(report.indexability.pages.values().all(|p| p.fetch.final_status == Some(200)));
    assert!(report.indexability.sitemaps.sample.results.iter().all(|r| r.status == Some(200)));
    assert!(!report.has_failures());
}
