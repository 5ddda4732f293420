// src/cli.rs
// =============================================================================
// Command-line interface (clap derive API).
//
//   indexguard audit <URL> [--mode standard|extended] [--ignore-robots]
//                          [--max-pages N] [--compact]
//   indexguard fetch <URL>
//
// Flags override the environment (see AuditConfig::from_env), which
// overrides the built-in defaults.
// =============================================================================

use clap::{Parser, Subcommand, ValueEnum};
use indexguard::{AnalysisMode, AuditConfig};

#[derive(Parser, Debug)]
#[command(
    name = "indexguard",
    version,
    about = "Audit a website for crawlability and indexability problems",
    long_about = "indexguard crawls a single website the way a search engine would (robots.txt, \
                  sitemaps, internal links) and reports what keeps its pages out of the index. \
                  Every request is checked against private and internal address ranges first."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full audit and print the JSON report
    ///
    /// Example: indexguard audit https://example.com --mode extended
    Audit {
        /// Website to audit; https:// is assumed when no scheme is given
        url: String,

        /// How much discovery effort to spend [default: standard]
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Crawl paths robots.txt disallows (the rules are still reported)
        #[arg(long)]
        ignore_robots: bool,

        /// Number of pages to analyze (capped by the hard limit)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Perform one guarded fetch and print status, redirects and headers
    ///
    /// Example: indexguard fetch http://example.com
    Fetch {
        url: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Standard,
    Extended,
}

impl From<Mode> for AnalysisMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Standard => AnalysisMode::Standard,
            Mode::Extended => AnalysisMode::Extended,
        }
    }
}

// Environment-derived config with the audit flags applied on top
pub fn audit_config(mode: Option<Mode>, ignore_robots: bool, max_pages: Option<usize>) -> AuditConfig {
    let mut config = AuditConfig::from_env();
    if let Some(mode) = mode {
        config.analysis_mode = mode.into();
    }
    if ignore_robots {
        config.ignore_robots = true;
    }
    if let Some(pages) = max_pages {
        config.max_pages = pages;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audit_flags() {
        let cli = Cli::parse_from([
            "indexguard",
            "audit",
            "example.com",
            "--mode",
            "extended",
            "--ignore-robots",
            "--max-pages",
            "5",
        ]);
        match cli.command {
            Commands::Audit {
                url,
                mode,
                ignore_robots,
                max_pages,
                compact,
            } => {
                assert_eq!(url, "example.com");
                assert_eq!(mode, Some(Mode::Extended));
                assert!(ignore_robots);
                assert_eq!(max_pages, Some(5));
                assert!(!compact);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = audit_config(Some(Mode::Extended), true, Some(3));
        assert_eq!(config.analysis_mode, AnalysisMode::Extended);
        assert!(config.ignore_robots);
        assert_eq!(config.max_pages, 3);
    }

    #[test]
    fn test_mode_flag_is_optional() {
        let cli = Cli::parse_from(["indexguard", "audit", "example.com"]);
        match cli.command {
            Commands::Audit { mode, .. } => assert_eq!(mode, None),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
