// src/crawl/sitemap.rs
// =============================================================================
// Sitemap discovery and parsing.
//
// Seeds come from robots.txt `Sitemap:` lines. When robots declares none,
// /sitemap.xml and /sitemap_index.xml are probed instead. Documents are
// processed breadth-first: a <sitemapindex> enqueues its children, a
// <urlset> contributes page candidates.
//
// Parsing uses quick-xml's pull reader. It never loads DTDs or resolves
// external entities; an entity reference it does not know is a parse error,
// so an XXE payload can only ever produce a ParseError.
// =============================================================================

use crate::config::AuditConfig;
use crate::crawl::robots::RobotsPolicy;
use crate::crawl::normalize::{accept_candidate, normalize_str};
use crate::error::SitemapParseError;
use crate::net::GuardedHttpClient;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use url::Url;

const PROBE_PATHS: [&str; 2] = ["/sitemap.xml", "/sitemap_index.xml"];
const SNIPPET_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SitemapKind {
    Urlset,
    Sitemapindex,
}

/// How a sitemap URL entered the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SitemapOrigin {
    Declared,
    Probed,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSitemap {
    pub kind: SitemapKind,
    /// Text of every <loc> element in document order
    pub locs: Vec<String>,
}

// Parses a sitemap document.
//
// Malformed XML, a document without a root element and elements left open
// at end of input are all errors.
pub fn parse_sitemap_xml(body: &str) -> Result<ParsedSitemap, SitemapParseError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut depth: usize = 0;
    let mut root: Option<String> = None;
    let mut in_loc = false;
    let mut text = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                if depth == 0 {
                    if root.is_some() {
                        return Err(SitemapParseError("multiple root elements".into()));
                    }
                    root = Some(name.clone());
                }
                depth += 1;
                in_loc = name == "loc";
                text.clear();
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    if root.is_some() {
                        return Err(SitemapParseError("multiple root elements".into()));
                    }
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase());
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_loc {
                    let value = e
                        .unescape()
                        .map_err(|err| SitemapParseError(format!("bad text in <loc>: {err}")))?;
                    text.push_str(&value);
                }
            }
            Ok(Event::CData(e)) => {
                if in_loc {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if in_loc {
                    let loc = text.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                    in_loc = false;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(SitemapParseError(format!(
                    "at byte {}: {err}",
                    reader.error_position()
                )))
            }
            // Declarations, comments, processing instructions and DOCTYPE
            // carry nothing we use and are never expanded
            Ok(_) => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(SitemapParseError("unexpected end of document (unclosed element)".into()));
    }
    let root = root.ok_or_else(|| SitemapParseError("no root element".into()))?;

    let kind = if root.contains("sitemapindex") {
        SitemapKind::Sitemapindex
    } else {
        SitemapKind::Urlset
    };
    Ok(ParsedSitemap { kind, locs })
}

/// One fetched (or attempted) sitemap document.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    pub origin: SitemapOrigin,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub kind: Option<SitemapKind>,
    pub urls: Vec<String>,
    pub parse_error: Option<String>,
    pub body_snippet: Option<String>,
}

impl SitemapEntry {
    fn new(url: &str, origin: SitemapOrigin) -> Self {
        Self {
            url: url.to_string(),
            origin,
            status: None,
            error: None,
            kind: None,
            urls: Vec::new(),
            parse_error: None,
            body_snippet: None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.status == Some(200) && self.error.is_none() && self.parse_error.is_none()
    }

    pub fn is_urlset(&self) -> bool {
        self.is_parsed() && self.kind == Some(SitemapKind::Urlset)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SitemapDiscovery {
    /// `Sitemap:` URLs from robots.txt, in file order
    pub declared: Vec<String>,
    /// Well-known paths tried because nothing was declared
    pub probed: Vec<String>,
    pub entries: Vec<SitemapEntry>,
    /// Same-host page candidates from every urlset, first-seen order
    pub candidates: Vec<String>,
}

// First `n` distinct page locs across fetched urlsets, in queue order
// (declared documents come first, then probes, then children)
pub fn sample(entries: &[SitemapEntry], n: usize) -> Vec<String> {
    let mut collected: Vec<String> = Vec::new();
    for entry in entries.iter().filter(|e| e.is_urlset()) {
        for loc in &entry.urls {
            if collected.len() >= n {
                return collected;
            }
            if !collected.contains(loc) {
                collected.push(loc.clone());
            }
        }
    }
    collected
}

pub struct SitemapResolver<'a> {
    client: &'a GuardedHttpClient,
    config: &'a AuditConfig,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(client: &'a GuardedHttpClient, config: &'a AuditConfig) -> Self {
        Self { client, config }
    }

    pub async fn discover(&self, site_root: &Url, robots: &RobotsPolicy) -> SitemapDiscovery {
        let declared = robots.rules.sitemaps.clone();
        let mut probed = Vec::new();
        let mut queue: VecDeque<(String, SitemapOrigin)> = VecDeque::new();

        if declared.is_empty() {
            for path in PROBE_PATHS {
                if let Ok(url) = site_root.join(path) {
                    probed.push(url.to_string());
                    queue.push_back((url.to_string(), SitemapOrigin::Probed));
                }
            }
        } else {
            for url in &declared {
                queue.push_back((url.clone(), SitemapOrigin::Declared));
            }
        }

        let mut entries: Vec<SitemapEntry> = Vec::new();
        let mut candidates: Vec<String> = Vec::new();
        let mut seen_candidates: HashSet<String> = HashSet::new();
        let mut seen_documents: HashSet<String> = HashSet::new();

        while let Some((raw_url, origin)) = queue.pop_front() {
            if entries.len() >= self.config.max_sitemap_documents {
                tracing::debug!(limit = self.config.max_sitemap_documents, "sitemap document cap reached");
                break;
            }
            if candidates.len() >= self.config.hard_cap_discovered {
                break;
            }

            let url = normalize_str(&raw_url, site_root.as_str()).unwrap_or(raw_url);
            if !seen_documents.insert(url.clone()) {
                continue;
            }

            let entry = self.fetch_entry(&url, origin).await;

            if entry.is_parsed() {
                match entry.kind {
                    Some(SitemapKind::Sitemapindex) => {
                        for child in &entry.urls {
                            queue.push_back((child.clone(), SitemapOrigin::Child));
                        }
                    }
                    Some(SitemapKind::Urlset) => {
                        for loc in &entry.urls {
                            if candidates.len() >= self.config.hard_cap_discovered {
                                break;
                            }
                            if let Some(candidate) = accept_candidate(loc, site_root, site_root) {
                                if seen_candidates.insert(candidate.clone()) {
                                    candidates.push(candidate);
                                }
                            }
                        }
                    }
                    None => {}
                }
            }

            entries.push(entry);
        }

        tracing::info!(
            documents = entries.len(),
            candidates = candidates.len(),
            "sitemap discovery finished"
        );

        SitemapDiscovery {
            declared,
            probed,
            entries,
            candidates,
        }
    }

    async fn fetch_entry(&self, url: &str, origin: SitemapOrigin) -> SitemapEntry {
        let mut entry = SitemapEntry::new(url, origin);

        let response = match self
            .client
            .fetch(url, self.config.max_sitemap_bytes, self.config.max_redirects)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url, error = %err, "sitemap fetch failed");
                entry.error = Some(err.to_string());
                return entry;
            }
        };

        entry.status = Some(response.status);
        let body = response.text();
        if !body.is_empty() {
            entry.body_snippet = Some(body.chars().take(SNIPPET_CHARS).collect());
        }
        if response.status != 200 {
            return entry;
        }

        match parse_sitemap_xml(&body) {
            Ok(parsed) => {
                entry.kind = Some(parsed.kind);
                entry.urls = parsed.locs;
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "sitemap parse failed");
                entry.parse_error = Some(err.0);
            }
        }
        entry
    }
}
