// src/signals/mod.rs
// =============================================================================
// What the audit observes on each page and across the site.
//
// - html: synchronous HTML extraction helpers (scraper)
// - important: classifies homepage links into important page groups
// - extract: per-page signals and the site-wide signal record
// =============================================================================

pub mod extract;
pub mod html;
pub mod important;

pub use extract::{
    CanonicalSignal, CanonicalTag, IndexabilitySignalExtractor, IndexabilitySignals, MetaDirectives, PageSignals,
    SampleResult, SitemapSignals,
};
pub use important::ImportantPages;
