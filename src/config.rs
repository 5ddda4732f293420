// src/config.rs
// =============================================================================
// Immutable audit configuration.
//
// Every cap and timeout the pipeline honours lives here. An AuditConfig is
// built once (defaults -> environment -> CLI flags) and then handed by
// reference to each component at construction time. Nothing reads globals.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How much discovery effort an audit spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Robots, sitemaps and static BFS only
    #[default]
    Standard,
    /// Also allows the headless-browser fallback
    Extended,
}

impl AnalysisMode {
    // Unknown values fall back to standard rather than failing the run
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "extended" => AnalysisMode::Extended,
            _ => AnalysisMode::Standard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Token matched against robots.txt User-agent groups (besides `*`)
    pub robots_agent: String,
    pub request_timeout_secs: u64,
    pub max_html_bytes: usize,
    pub max_sitemap_bytes: usize,
    pub max_redirects: usize,
    pub hard_cap_discovered: usize,
    pub hard_cap_analyzed: usize,
    /// Target number of analyzed pages (clamped by hard_cap_analyzed)
    pub max_pages: usize,
    /// Pages BFS may fetch before it stops expanding
    pub bfs_fetch_budget: usize,
    pub max_sitemap_documents: usize,
    pub sitemap_sample_size: usize,
    pub fallback_threshold: usize,
    pub render_timeout_secs: u64,
    pub render_settle_ms: u64,
    pub render_max_urls: usize,
    pub analysis_mode: AnalysisMode,
    pub ignore_robots: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            user_agent: "indexguard/0.1 (+https://github.com/indexguard)".to_string(),
            robots_agent: "indexguard".to_string(),
            request_timeout_secs: 15,
            max_html_bytes: 2 * 1024 * 1024,
            max_sitemap_bytes: 10 * 1024 * 1024,
            max_redirects: 10,
            hard_cap_discovered: 2000,
            hard_cap_analyzed: 500,
            max_pages: 25,
            bfs_fetch_budget: 200,
            max_sitemap_documents: 50,
            sitemap_sample_size: 20,
            fallback_threshold: 5,
            render_timeout_secs: 10,
            render_settle_ms: 1500,
            render_max_urls: 50,
            analysis_mode: AnalysisMode::Standard,
            ignore_robots: false,
        }
    }
}

impl AuditConfig {
    // Defaults with environment overrides applied.
    //
    // Supported variables:
    //   INDEXGUARD_IGNORE_ROBOTS=1     -> ignore_robots = true
    //   INDEXGUARD_MAX_PAGES=<n>       -> max_pages
    //   INDEXGUARD_TIMEOUT_SECS=<n>    -> request_timeout_secs
    //   INDEXGUARD_USER_AGENT=<ua>     -> user_agent
    //   INDEXGUARD_ANALYSIS_MODE=<m>   -> analysis_mode (unknown -> standard)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    // Split out so tests can feed a fake environment
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("INDEXGUARD_IGNORE_ROBOTS") {
            self.ignore_robots = matches!(val.trim(), "1" | "true" | "yes");
            tracing::debug!("Override ignore_robots from env: {}", self.ignore_robots);
        }
        if let Some(pages) = lookup("INDEXGUARD_MAX_PAGES").and_then(|v| v.trim().parse().ok()) {
            self.max_pages = pages;
            tracing::debug!("Override max_pages from env: {}", pages);
        }
        if let Some(secs) = lookup("INDEXGUARD_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.request_timeout_secs = secs;
            tracing::debug!("Override request_timeout_secs from env: {}", secs);
        }
        if let Some(ua) = lookup("INDEXGUARD_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            self.user_agent = ua;
        }
        if let Some(mode) = lookup("INDEXGUARD_ANALYSIS_MODE") {
            self.analysis_mode = AnalysisMode::parse_lenient(&mode);
            tracing::debug!("Override analysis_mode from env: {:?}", self.analysis_mode);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.hard_cap_discovered, 2000);
        assert_eq!(config.max_pages, 25);
        assert_eq!(config.hard_cap_analyzed, 500);
        assert_eq!(config.analysis_mode, AnalysisMode::Standard);
        assert!(!config.ignore_robots);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("INDEXGUARD_IGNORE_ROBOTS", "1"),
            ("INDEXGUARD_MAX_PAGES", "900"),
            ("INDEXGUARD_TIMEOUT_SECS", "not-a-number"),
            ("INDEXGUARD_ANALYSIS_MODE", " Extended "),
        ]);
        let mut config = AuditConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.ignore_robots);
        assert_eq!(config.max_pages, 900);
        // Unparsable values leave the default alone
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.analysis_mode, AnalysisMode::Extended);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AuditConfig =
            serde_json::from_str(r#"{"analysis_mode": "extended", "max_pages": 3}"#).unwrap();
        assert_eq!(config.analysis_mode, AnalysisMode::Extended);
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.fallback_threshold, 5);
    }

    #[test]
    fn test_mode_parse_lenient() {
        assert_eq!(AnalysisMode::parse_lenient(" Extended "), AnalysisMode::Extended);
        assert_eq!(AnalysisMode::parse_lenient("turbo"), AnalysisMode::Standard);
    }

    #[test]
    fn test_unknown_env_mode_falls_back_to_standard() {
        let mut config = AuditConfig {
            analysis_mode: AnalysisMode::Extended,
            ..AuditConfig::default()
        };
        config.apply_env(|key| (key == "INDEXGUARD_ANALYSIS_MODE").then(|| "turbo".to_string()));
        assert_eq!(config.analysis_mode, AnalysisMode::Standard);
    }
}
