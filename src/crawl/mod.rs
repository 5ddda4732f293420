// src/crawl/mod.rs
// =============================================================================
// Site discovery: which URLs exist, which ones we may fetch, and which ones
// get analyzed.
//
// Sources, in the order they run:
// - robots.txt (policy + declared sitemaps)
// - sitemaps (declared, or probed at the well-known paths)
// - breadth-first link discovery from the homepage
// - headless-browser render fallback (extended mode, thin sites only)
//
// The coordinator merges all of them under the configured caps.
// =============================================================================

pub mod coordinator;
pub mod inventory;
pub mod normalize;
pub mod pages;
pub mod queue;
pub mod render;
pub mod robots;
pub mod sitemap;

pub use coordinator::{CrawlCoordinator, CrawlPage, CrawlRecord, CrawlRun};
pub use inventory::PageInventory;
pub use pages::PageFetcher;
pub use queue::{BfsOutcome, BfsStop, LinkDiscoveryEngine};
pub use render::{ChromiumRenderer, PageRenderer, RenderFallback, RenderOutcome, RenderTarget, RenderedPage};
pub use robots::{RobotsDecision, RobotsPolicy};
pub use sitemap::{SitemapDiscovery, SitemapEntry, SitemapKind, SitemapResolver};
