// src/crawl/robots.rs
// =============================================================================
// robots.txt fetching, parsing and the per-run crawl decision.
//
// Matching is intentionally literal: `Disallow: /` blocks everything and any
// other rule starting with "/" blocks paths that start with it. There is no
// wildcard or `$` handling and Allow lines are not read. Only the `*` group
// and our own agent's group are consulted, in that order.
//
// Decision table:
//   ignore_robots set          -> ignore / robots_ignored
//   fetch error or status!=200 -> allow  / robots_unreachable_allow
//   otherwise                  -> respect / robots_fetched
//
// An unreachable robots.txt fails OPEN, while an unresolvable hostname
// elsewhere fails CLOSED. The reason string makes the former visible in
// every report.
// =============================================================================

use crate::config::AuditConfig;
use crate::error::FetchError;
use crate::net::GuardedHttpClient;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

const SNIPPET_CHARS: usize = 800;

/// What robots.txt means for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotsDecision {
    Respect,
    Allow,
    Ignore,
}

impl RobotsDecision {
    pub fn reason(&self) -> &'static str {
        match self {
            RobotsDecision::Respect => "robots_fetched",
            RobotsDecision::Allow => "robots_unreachable_allow",
            RobotsDecision::Ignore => "robots_ignored",
        }
    }
}

/// Parsed robots.txt content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RobotsRules {
    /// Lower-cased user agent -> Disallow values in file order
    pub ua_rules: BTreeMap<String, Vec<String>>,
    /// `Sitemap:` URLs in file order
    pub sitemaps: Vec<String>,
}

// Parses User-agent / Disallow / Sitemap lines
pub fn parse_robots(txt: &str) -> RobotsRules {
    let mut rules = RobotsRules::default();
    let mut current_uas: Vec<String> = Vec::new();
    // Consecutive User-agent lines form one group
    let mut last_was_agent = false;

    for line in txt.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let ua = value.to_ascii_lowercase();
                if !last_was_agent {
                    current_uas.clear();
                }
                rules.ua_rules.entry(ua.clone()).or_default();
                current_uas.push(ua);
                last_was_agent = true;
            }
            "disallow" => {
                if current_uas.is_empty() {
                    current_uas.push("*".to_string());
                }
                for ua in &current_uas {
                    rules
                        .ua_rules
                        .entry(ua.clone())
                        .or_default()
                        .push(value.to_string());
                }
                last_was_agent = false;
            }
            "sitemap" => {
                if !value.is_empty() {
                    rules.sitemaps.push(value.to_string());
                }
            }
            _ => {
                last_was_agent = false;
            }
        }
    }

    rules
}

// First rule in `rules` that blocks `path`
fn first_match<'a>(rules: &'a [String], path: &str) -> Option<&'a str> {
    rules.iter().map(|r| r.trim()).find(|rule| {
        if rule.is_empty() {
            // "Disallow:" with no value allows everything
            return false;
        }
        *rule == "/" || (rule.starts_with('/') && path.starts_with(rule))
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotsPolicy {
    pub url: String,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    #[serde(flatten)]
    pub rules: RobotsRules,
    pub body_snippet: Option<String>,
    pub decision: RobotsDecision,
    pub reason: String,
    #[serde(skip)]
    agent: String,
}

impl RobotsPolicy {
    // Fetches `<site_root>/robots.txt` through the guarded client
    pub async fn build(client: &GuardedHttpClient, site_root: &Url, config: &AuditConfig) -> Self {
        let robots_url = match site_root.join("/robots.txt") {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}robots.txt", site_root),
        };

        let outcome = client
            .fetch(&robots_url, config.max_html_bytes, config.max_redirects)
            .await
            .map(|response| (response.status, response.text()));

        let policy = Self::from_outcome(
            &robots_url,
            outcome,
            config.ignore_robots,
            &config.robots_agent,
        );
        tracing::info!(
            url = %policy.url,
            status = ?policy.http_status,
            decision = ?policy.decision,
            "robots policy"
        );
        policy
    }

    // Builds the policy from an already-performed fetch
    pub fn from_outcome(
        robots_url: &str,
        outcome: Result<(u16, String), FetchError>,
        ignore_robots: bool,
        agent: &str,
    ) -> Self {
        let (http_status, error, body) = match outcome {
            Ok((status, body)) => (Some(status), None, body),
            Err(err) => (None, Some(err.to_string()), String::new()),
        };

        let rules = if http_status == Some(200) {
            parse_robots(&body)
        } else {
            RobotsRules::default()
        };

        let decision = if ignore_robots {
            RobotsDecision::Ignore
        } else if error.is_some() || http_status != Some(200) {
            RobotsDecision::Allow
        } else {
            RobotsDecision::Respect
        };

        let body_snippet = if body.is_empty() {
            None
        } else {
            Some(body.chars().take(SNIPPET_CHARS).collect())
        };

        Self {
            url: robots_url.to_string(),
            http_status,
            error,
            rules,
            body_snippet,
            decision,
            reason: decision.reason().to_string(),
            agent: agent.to_ascii_lowercase(),
        }
    }

    pub fn rules_for(&self, ua: &str) -> &[String] {
        self.rules
            .ua_rules
            .get(&ua.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // First rule of one agent's group that blocks the URL, regardless of the
    // run's decision. Used for evidence.
    pub fn matching_rule(&self, url: &Url, ua: &str) -> Option<&str> {
        first_match(self.rules_for(ua), url.path())
    }

    // The rule that stops us from fetching the URL in this run, if any
    pub fn blocking_rule(&self, url: &Url) -> Option<&str> {
        if self.decision != RobotsDecision::Respect {
            return None;
        }
        self.matching_rule(url, "*")
            .or_else(|| self.matching_rule(url, &self.agent))
    }

    pub fn is_allowed(&self, url: &Url) -> bool {
        self.blocking_rule(url).is_none()
    }

    // is_allowed as a Result carrying the blocking rule
    pub fn check(&self, url: &Url) -> Result<(), FetchError> {
        match self.blocking_rule(url) {
            Some(rule) => Err(FetchError::RobotsDisallowed(rule.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(body: &str) -> RobotsPolicy {
        RobotsPolicy::from_outcome(
            "https://example.com/robots.txt",
            Ok((200, body.to_string())),
            false,
            "indexguard",
        )
    }

    fn url(path: &str) -> Url {
        Url::parse("https://example.com/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_parse_groups_and_sitemaps() {
        let rules = parse_robots(
            "User-agent: Googlebot\nUser-agent: Bingbot\nDisallow: /private # internal\n\nUser-agent: *\nDisallow:\nSitemap: https://example.com/sitemap.xml\n",
        );
        assert_eq!(rules.ua_rules["googlebot"], vec!["/private"]);
        assert_eq!(rules.ua_rules["bingbot"], vec!["/private"]);
        assert_eq!(rules.ua_rules["*"], vec![""]);
        assert_eq!(rules.sitemaps, vec!["https://example.com/sitemap.xml"]);
    }

    #[test]
    fn test_disallow_before_user_agent_applies_to_star() {
        let rules = parse_robots("Disallow: /tmp\n");
        assert_eq!(rules.ua_rules["*"], vec!["/tmp"]);
    }

    #[test]
    fn test_agent_after_rule_starts_new_group() {
        let rules = parse_robots("User-agent: a\nDisallow: /a\nUser-agent: b\nDisallow: /b\n");
        assert_eq!(rules.ua_rules["a"], vec!["/a"]);
        assert_eq!(rules.ua_rules["b"], vec!["/b"]);
    }

    #[test]
    fn test_broad_disallow_blocks_everything() {
        let p = policy("User-agent: *\nDisallow: /\n");
        assert_eq!(p.decision, RobotsDecision::Respect);
        assert_eq!(p.reason, "robots_fetched");
        assert!(!p.is_allowed(&url("/")));
        assert!(!p.is_allowed(&url("/anything")));
    }

    #[test]
    fn test_literal_prefix_no_wildcards() {
        let p = policy("User-agent: *\nDisallow: /admin\nDisallow: /*.php\n");
        assert!(!p.is_allowed(&url("/admin/users")));
        assert!(!p.is_allowed(&url("/administrator")));
        // Wildcards are not expanded
        assert!(p.is_allowed(&url("/index.php")));
        assert_eq!(p.matching_rule(&url("/admin"), "*"), Some("/admin"));
    }

    #[test]
    fn test_own_agent_group_is_consulted() {
        let p = policy("User-agent: indexguard\nDisallow: /drafts\n");
        assert!(!p.is_allowed(&url("/drafts/1")));
        assert!(matches!(
            p.check(&url("/drafts/1")),
            Err(FetchError::RobotsDisallowed(rule)) if rule == "/drafts"
        ));
    }

    #[test]
    fn test_unreachable_robots_fails_open() {
        let p = RobotsPolicy::from_outcome(
            "https://example.com/robots.txt",
            Err(FetchError::Timeout),
            false,
            "indexguard",
        );
        assert_eq!(p.decision, RobotsDecision::Allow);
        assert_eq!(p.reason, "robots_unreachable_allow");
        assert!(p.is_allowed(&url("/")));

        let p = RobotsPolicy::from_outcome(
            "https://example.com/robots.txt",
            Ok((500, "User-agent: *\nDisallow: /".into())),
            false,
            "indexguard",
        );
        assert_eq!(p.decision, RobotsDecision::Allow);
        assert!(p.rules.ua_rules.is_empty());
    }

    #[test]
    fn test_ignore_still_parses() {
        let p = RobotsPolicy::from_outcome(
            "https://example.com/robots.txt",
            Ok((200, "User-agent: *\nDisallow: /\n".into())),
            true,
            "indexguard",
        );
        assert_eq!(p.decision, RobotsDecision::Ignore);
        assert!(p.is_allowed(&url("/")));
        assert_eq!(p.rules_for("*"), ["/".to_string()]);
    }
}
