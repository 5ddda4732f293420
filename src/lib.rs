// src/lib.rs
// =============================================================================
// indexguard: crawlability and indexability audits for a single website,
// with every outbound request passing an SSRF guard first.
//
// Layers, bottom up:
// - net: guarded HTTP (address checks, DNS pinning, manual redirects, caps)
// - crawl: robots.txt, sitemaps, link discovery, render fallback, inventory
// - signals: per-page directives, canonicals, important pages
// - findings: fixed-id rules and the severity policy gate
// - audit: the pipeline tying them together
// =============================================================================

pub mod audit;
pub mod config;
pub mod crawl;
pub mod error;
pub mod findings;
pub mod net;
pub mod signals;

pub use audit::{AuditReport, Auditor};
pub use config::{AnalysisMode, AuditConfig};
pub use error::{AuditError, FetchError};
