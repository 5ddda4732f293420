// src/crawl/queue.rs
// =============================================================================
// Same-host link discovery with a breadth-first queue.
//
// How it works:
// 1. Start with the normalized homepage in a queue
// 2. Skip pages robots.txt disallows (they are never fetched)
// 3. Fetch the page through the shared PageFetcher
// 4. Extract anchors, normalize them, keep same-host HTML candidates
// 5. Enqueue candidates nobody has seen yet
// 6. Stop at the discovered cap, the fetch budget or an empty queue
//
// Only URLs new to this run are enqueued. Pages that came from a sitemap
// are analyzed later but not expanded here.
// =============================================================================

use crate::config::AuditConfig;
use crate::crawl::pages::PageFetcher;
use crate::crawl::robots::RobotsPolicy;
use crate::crawl::normalize::accept_candidate;
use crate::signals::html::anchor_hrefs;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Why the BFS loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BfsStop {
    QueueEmpty,
    DiscoveredCap,
    FetchBudget,
}

#[derive(Debug, Clone, Serialize)]
pub struct BfsOutcome {
    /// URLs found by BFS that were not already known, in discovery order
    #[serde(skip)]
    pub candidates: Vec<String>,
    pub fetched_pages: usize,
    pub urls_added: usize,
    pub skipped_by_robots: usize,
    pub stop: BfsStop,
}

pub struct LinkDiscoveryEngine<'a> {
    config: &'a AuditConfig,
}

impl<'a> LinkDiscoveryEngine<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    // Crawls from `homepage`. `known` holds every URL already discovered by
    // other sources; it counts toward the discovered cap.
    pub async fn discover(
        &self,
        homepage: &Url,
        site_root: &Url,
        robots: &RobotsPolicy,
        pages: &mut PageFetcher<'_>,
        known: &HashSet<String>,
    ) -> BfsOutcome {
        let mut seen: HashSet<String> = known.clone();
        seen.insert(homepage.to_string());

        let mut queue: VecDeque<String> = VecDeque::from([homepage.to_string()]);
        let mut candidates: Vec<String> = Vec::new();
        let mut fetched_pages = 0;
        let mut skipped_by_robots = 0;

        let stop = loop {
            if known.len() + candidates.len() >= self.config.hard_cap_discovered {
                break BfsStop::DiscoveredCap;
            }
            if fetched_pages >= self.config.bfs_fetch_budget {
                break BfsStop::FetchBudget;
            }
            let Some(current) = queue.pop_front() else {
                break BfsStop::QueueEmpty;
            };

            let page = match pages.fetch_allowed(&current, robots).await {
                Ok(page) => page,
                Err(_) => {
                    skipped_by_robots += 1;
                    continue;
                }
            };
            fetched_pages += 1;

            if page.error.is_some() || page.final_status.is_none() || page.body.is_empty() || !page.is_html() {
                continue;
            }

            // Relative links resolve against where the page actually ended up
            let base = Url::parse(&page.final_url).unwrap_or_else(|_| homepage.clone());

            for href in anchor_hrefs(&page.body) {
                if known.len() + candidates.len() >= self.config.hard_cap_discovered {
                    break;
                }
                let Some(url) = accept_candidate(&href, &base, site_root) else {
                    continue;
                };
                if seen.insert(url.clone()) {
                    queue.push_back(url.clone());
                    candidates.push(url);
                }
            }
        };

        tracing::info!(
            fetched = fetched_pages,
            added = candidates.len(),
            reason = ?stop,
            "bfs discovery finished"
        );

        BfsOutcome {
            urls_added: candidates.len(),
            candidates,
            fetched_pages,
            skipped_by_robots,
            stop,
        }
    }
}
