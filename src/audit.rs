// src/audit.rs
// =============================================================================
// The audit pipeline, end to end.
//
//   target URL
//     -> safety check + homepage fetch (aborts the run on a safety failure)
//     -> crawl: robots, sitemaps, BFS, optional render fallback, inventory
//     -> signals for every analyzed and important page
//     -> findings rules -> policy gate
//     -> AuditReport
//
// One Auditor can run many audits; each run builds its own PageFetcher, so
// runs share nothing but the HTTP client and the config.
// =============================================================================

use crate::config::AuditConfig;
use crate::crawl::normalize::site_root;
use crate::crawl::{ChromiumRenderer, CrawlCoordinator, CrawlRecord, PageFetcher, PageRenderer};
use crate::error::AuditError;
use crate::findings::{enforce_policy, evaluate, Finding, Severity};
use crate::net::guard::check_url;
use crate::net::GuardedHttpClient;
use crate::signals::{IndexabilitySignalExtractor, IndexabilitySignals};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// The normalized target the run started from
    pub target: String,
    pub crawl: CrawlRecord,
    pub indexability: IndexabilitySignals,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn has_failures(&self) -> bool {
        self.findings.iter().any(Finding::is_fail)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}

// Operator input -> `scheme://host[:port]/path`.
//
// A missing scheme defaults to https. Host is lower-cased, default ports,
// query and fragment are dropped.
pub fn normalize_target(raw: &str) -> Result<Url, AuditError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AuditError::InvalidTarget(raw.to_string()));
    }
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|_| AuditError::InvalidTarget(raw.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AuditError::InvalidTarget(raw.to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AuditError::InvalidTarget(raw.to_string()));
    }
    url.set_query(None);
    url.set_fragment(None);
    if url.path().is_empty() {
        url.set_path("/");
    }
    Ok(url)
}

pub struct Auditor {
    config: AuditConfig,
    client: GuardedHttpClient,
    renderer: Option<Box<dyn PageRenderer>>,
}

impl Auditor {
    // System DNS, reqwest transport and headless Chromium
    pub fn new(config: AuditConfig) -> Self {
        let client = GuardedHttpClient::from_config(&config);
        let renderer: Box<dyn PageRenderer> = Box::new(ChromiumRenderer::new(&config));
        Self {
            config,
            client,
            renderer: Some(renderer),
        }
    }

    // A caller-supplied client and no render fallback
    pub fn with_client(config: AuditConfig, client: GuardedHttpClient) -> Self {
        Self {
            config,
            client,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub async fn run(&self, target: &str) -> Result<AuditReport, AuditError> {
        let homepage = normalize_target(target)?;
        tracing::info!(target = %homepage, mode = ?self.config.analysis_mode, "starting audit");

        check_url(&homepage, self.client.resolver())
            .await
            .map_err(AuditError::UnsafeHomepage)?;

        let mut pages = PageFetcher::new(&self.client, self.config.max_html_bytes);

        let home = pages.fetch(homepage.as_str()).await;
        if let Some(err) = home.failure.as_ref().filter(|e| e.is_safety_failure()) {
            tracing::warn!(target = %homepage, error = %err, "homepage rejected");
            return Err(AuditError::UnsafeHomepage(err.clone()));
        }

        // Redirects (http -> https, apex -> www) move the site root with them
        let root = Url::parse(&home.final_url)
            .ok()
            .filter(|_| home.error.is_none())
            .and_then(|url| site_root(&url))
            .or_else(|| site_root(&homepage))
            .ok_or_else(|| AuditError::InvalidTarget(homepage.to_string()))?;

        let crawl = CrawlCoordinator::new(&self.config, &self.client, self.renderer.as_deref())
            .run(&homepage, &root, &mut pages)
            .await;

        let indexability = IndexabilitySignalExtractor::new(&self.config, &crawl.robots)
            .collect(&homepage, &root, &crawl, &mut pages)
            .await;

        let findings = enforce_policy(evaluate(&indexability));

        tracing::info!(
            discovered = crawl.record.discovered_count,
            analyzed = crawl.record.analyzed_count,
            findings = findings.len(),
            requests = pages.network_fetches(),
            "audit finished"
        );

        Ok(AuditReport {
            target: homepage.to_string(),
            crawl: crawl.record,
            indexability,
            findings,
        })
    }
}
