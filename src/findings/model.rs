// src/findings/model.rs
// =============================================================================
// The Finding record and its evidence.
//
// Evidence is a tagged enum: the `type` field in JSON is the variant name in
// snake_case, and consumers match on it instead of probing for keys.
// =============================================================================

use crate::net::RedirectHop;
use crate::signals::extract::SampleResult;
use crate::signals::html::MetaRobotsTag;
use crate::signals::CanonicalTag;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const CATEGORY: &str = "indexability_technical_access";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fail,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fail => write!(f, "fail"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofCompleteness {
    Complete,
    Partial,
    Supporting,
}

impl fmt::Display for ProofCompleteness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofCompleteness::Complete => write!(f, "complete"),
            ProofCompleteness::Partial => write!(f, "partial"),
            ProofCompleteness::Supporting => write!(f, "supporting"),
        }
    }
}

/// A URL robots.txt blocks, and the rule that does it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedUrl {
    pub ua: String,
    pub url: String,
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockMatch {
    pub ua: String,
    pub rule: String,
}

/// One page sharing an off-page canonical target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedPage {
    pub url: String,
    pub final_url: String,
    pub http_status: Option<u16>,
    pub snippet: String,
}

/// A sitemap URL with how its fetch went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapStatus {
    pub url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidSitemap {
    pub url: String,
    pub status: Option<u16>,
    pub parse_error: String,
    pub body_snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub url: String,
    pub rule: Option<String>,
}

/// The shapes an `html_tag` evidence can take.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HtmlTagEvidence {
    MetaNoindex {
        url: String,
        final_url: String,
        http_status: Option<u16>,
        snippet: String,
        attrs: BTreeMap<String, String>,
    },
    Directives {
        url: String,
        final_url: String,
        http_status: Option<u16>,
        meta_robots: Vec<MetaRobotsTag>,
        meta_googlebot: Vec<MetaRobotsTag>,
        x_robots_tag: String,
    },
    Canonicals {
        url: String,
        final_url: String,
        http_status: Option<u16>,
        found_count: usize,
        canonicals: Vec<CanonicalTag>,
    },
    CanonicalOffpage {
        canonical_href: String,
        canonical_resolved: String,
        affected_pages: Vec<AffectedPage>,
        /// Status of the canonical target fetch, when one was made
        target_status: Option<u16>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evidence {
    HtmlTag(HtmlTagEvidence),
    ResponseHeaders {
        url: String,
        final_url: String,
        http_status: Option<u16>,
        headers_subset: BTreeMap<String, String>,
    },
    HttpRedirectChain {
        url: String,
        final_url: String,
        final_status: Option<u16>,
        redirect_chain: Vec<RedirectHop>,
        error: Option<String>,
        /// "loop" or "too_many_redirects" for redirect failures
        reason: Option<String>,
    },
    RobotsTxt {
        url: String,
        http_status: Option<u16>,
        error: Option<String>,
        snippet: String,
        parsed_summary: Option<BTreeMap<String, Vec<String>>>,
        robots_block_match: Option<BlockMatch>,
    },
    RobotsBlockMatch {
        robots_url: String,
        robots_http_status: Option<u16>,
        blocked: Vec<BlockedUrl>,
        robots_snippet: String,
    },
    SitemapFetch {
        declared: Vec<SitemapStatus>,
        probed: Vec<SitemapStatus>,
        robots_snippet: String,
    },
    SitemapParse {
        invalid: Vec<InvalidSitemap>,
    },
    SitemapSampleResult {
        strategy: String,
        n: usize,
        failing_count: usize,
        sample: Vec<SampleResult>,
    },
    Discoverability {
        page_url: String,
        found_in_homepage_links: bool,
        found_in_sitemap: bool,
        checked_sources: Vec<String>,
    },
    PageFetch {
        robots_url: String,
        pages: Vec<SkippedPage>,
    },
}

/// Structured record of a policy rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyAction {
    SeverityClamp {
        from: Severity,
        to: Severity,
        reason: String,
        confidence_level: Confidence,
        proof_completeness: ProofCompleteness,
    },
}

/// Fixed bilingual copy for one finding id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindingCopy {
    pub id: &'static str,
    pub title_en: &'static str,
    pub title_ro: &'static str,
    pub description_en: &'static str,
    pub description_ro: &'static str,
    pub recommendation_en: &'static str,
    pub recommendation_ro: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub id: String,
    pub category: String,
    pub severity: Severity,
    /// Unset until a rule or the policy assigns it
    pub confidence_level: Option<Confidence>,
    pub proof_completeness: Option<ProofCompleteness>,
    pub title_en: String,
    pub title_ro: String,
    pub description_en: String,
    pub description_ro: String,
    pub recommendation_en: String,
    pub recommendation_ro: String,
    pub evidence: Evidence,
    pub policy_notes: Vec<String>,
    pub policy_actions: Vec<PolicyAction>,
}

impl Finding {
    pub fn new(copy: &FindingCopy, severity: Severity, evidence: Evidence) -> Self {
        Self {
            id: copy.id.to_string(),
            category: CATEGORY.to_string(),
            severity,
            confidence_level: None,
            proof_completeness: None,
            title_en: copy.title_en.to_string(),
            title_ro: copy.title_ro.to_string(),
            description_en: copy.description_en.to_string(),
            description_ro: copy.description_ro.to_string(),
            recommendation_en: copy.recommendation_en.to_string(),
            recommendation_ro: copy.recommendation_ro.to_string(),
            evidence,
            policy_notes: Vec::new(),
            policy_actions: Vec::new(),
        }
    }

    pub fn with_proof(mut self, confidence: Confidence, proof: ProofCompleteness) -> Self {
        self.confidence_level = Some(confidence);
        self.proof_completeness = Some(proof);
        self
    }

    // Direct observation: high confidence, complete proof
    pub fn observed(self) -> Self {
        self.with_proof(Confidence::High, ProofCompleteness::Complete)
    }

    // Inferred from an error or from something missing
    pub fn inferred(self) -> Self {
        self.with_proof(Confidence::Medium, ProofCompleteness::Partial)
    }

    pub fn is_fail(&self) -> bool {
        self.severity == Severity::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COPY: FindingCopy = FindingCopy {
        id: "IDX_TEST",
        title_en: "t",
        title_ro: "t",
        description_en: "d",
        description_ro: "d",
        recommendation_en: "r",
        recommendation_ro: "r",
    };

    #[test]
    fn test_evidence_is_tagged() {
        let finding = Finding::new(
            &COPY,
            Severity::Warning,
            Evidence::SitemapParse { invalid: Vec::new() },
        )
        .observed();
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["evidence"], json!({"type": "sitemap_parse", "invalid": []}));
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["confidence_level"], "high");
        assert_eq!(value["proof_completeness"], "complete");
        assert_eq!(value["category"], CATEGORY);
    }

    #[test]
    fn test_html_tag_evidence_flattens_into_tag() {
        let evidence = Evidence::HtmlTag(HtmlTagEvidence::Canonicals {
            url: "https://e.test/".into(),
            final_url: "https://e.test/".into(),
            http_status: Some(200),
            found_count: 0,
            canonicals: Vec::new(),
        });
        let value = serde_json::to_value(&evidence).unwrap();
        assert_eq!(value["type"], "html_tag");
        assert_eq!(value["found_count"], 0);
    }
}
