// src/signals/html.rs
// =============================================================================
// Everything the audit reads out of an HTML document.
//
// All functions here are synchronous and take the raw HTML string. scraper's
// `Html` is not Send, so documents are parsed, queried and dropped inside
// one call and never held across an .await.
//
// Extracted:
// - anchors (href + visible text) for BFS and important-page detection
// - <meta name="robots|googlebot"> tags
// - <link rel="canonical"> tags
// - <title>
// - link-like values a rendered page exposes (data-* attributes, inline
//   location assignments) for the render fallback
// =============================================================================

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const SNIPPET_CHARS: usize = 300;

// Attributes some sites use instead of href for navigation
const DATA_LINK_ATTRS: [&str; 3] = ["data-href", "data-url", "data-link"];

// The selectors below are constants; parsing them cannot fail at runtime
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("constant selector is valid")
}

fn location_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:location\.href|window\.location|document\.location)\s*=\s*['"]([^'"]+)['"]"#)
            .expect("location regex is valid")
    })
}

/// An <a href> with its collapsed visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// A robots meta tag as it appeared in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaRobotsTag {
    /// Lower-cased `name` attribute (robots or googlebot)
    pub name: String,
    pub content: String,
    pub snippet: String,
    pub attrs: BTreeMap<String, String>,
}

/// A canonical link element before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLink {
    pub href: String,
    pub snippet: String,
}

/// Raw link candidates found in a rendered DOM, grouped by where they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomCandidates {
    pub hrefs: Vec<String>,
    pub data_attrs: Vec<String>,
    /// From onclick handlers and inline scripts
    pub inline_js: Vec<String>,
}

fn snippet(element: &ElementRef) -> String {
    element.html().chars().take(SNIPPET_CHARS).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Extracts every non-empty href, skipping in-page anchors and
// mailto:/tel:/javascript: links
pub fn anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    let a = selector("a[href]");

    document
        .select(&a)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            let lower = href.to_ascii_lowercase();
            if lower.starts_with("mailto:") || lower.starts_with("tel:") || lower.starts_with("javascript:") {
                return None;
            }
            Some(Anchor {
                href: href.to_string(),
                text: collapse_whitespace(&element.text().collect::<String>()),
            })
        })
        .collect()
}

pub fn anchor_hrefs(html: &str) -> Vec<String> {
    anchors(html).into_iter().map(|a| a.href).collect()
}

pub fn title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let t = selector("title");
    document
        .select(&t)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

// All <meta name="robots"> and <meta name="googlebot"> tags in order
pub fn meta_robots(html: &str) -> Vec<MetaRobotsTag> {
    let document = Html::parse_document(html);
    let meta = selector("meta[name]");

    document
        .select(&meta)
        .filter_map(|element| {
            let name = element.value().attr("name")?.trim().to_ascii_lowercase();
            if name != "robots" && name != "googlebot" {
                return None;
            }
            let attrs = element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Some(MetaRobotsTag {
                content: element.value().attr("content").unwrap_or("").trim().to_string(),
                snippet: snippet(&element),
                name,
                attrs,
            })
        })
        .collect()
}

// All <link> elements whose rel tokens include "canonical"
pub fn canonical_links(html: &str) -> Vec<CanonicalLink> {
    let document = Html::parse_document(html);
    let link = selector("link[rel]");

    document
        .select(&link)
        .filter(|element| {
            element
                .value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|t| t.eq_ignore_ascii_case("canonical")))
                .unwrap_or(false)
        })
        .map(|element| CanonicalLink {
            href: element.value().attr("href").unwrap_or("").trim().to_string(),
            snippet: snippet(&element),
        })
        .collect()
}

// Pulls `location.href = '...'` style targets out of a script fragment
pub fn location_targets(script: &str) -> Vec<String> {
    location_assignment()
        .captures_iter(script)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// Link candidates from a (usually rendered) DOM
pub fn dom_candidates(html: &str) -> DomCandidates {
    let document = Html::parse_document(html);
    let all = selector("*");
    let inline_script = selector("script:not([src])");
    let mut out = DomCandidates::default();

    for element in document.select(&all) {
        let value = element.value();
        if value.name() == "a" {
            if let Some(href) = value.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                out.hrefs.push(href.to_string());
            }
        }
        for attr in DATA_LINK_ATTRS {
            if let Some(v) = value.attr(attr).map(str::trim).filter(|v| !v.is_empty()) {
                out.data_attrs.push(v.to_string());
            }
        }
        if let Some(onclick) = value.attr("onclick") {
            out.inline_js.extend(location_targets(onclick));
        }
    }

    for script in document.select(&inline_script) {
        out.inline_js.extend(location_targets(&script.text().collect::<String>()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchors_skip_non_navigational() {
        let html = r##"
            <a href="/about">  About
               us </a>
            <a href="#top">Top</a>
            <a href="mailto:x@example.com">Mail</a>
            <a href="TEL:123">Call</a>
            <a href="">Empty</a>
        "##;
        let found = anchors(html);
        assert_eq!(found, vec![Anchor { href: "/about".into(), text: "About us".into() }]);
    }

    #[test]
    fn test_meta_robots_collects_all() {
        let html = r#"<head>
            <meta name="ROBOTS" content="noindex, follow">
            <meta name="googlebot" content="nosnippet">
            <meta name="description" content="x">
        </head>"#;
        let tags = meta_robots(html);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "robots");
        assert_eq!(tags[0].content, "noindex, follow");
        assert_eq!(tags[1].name, "googlebot");
        assert!(tags[0].snippet.starts_with("<meta"));
    }

    #[test]
    fn test_canonical_rel_tokens() {
        let html = r#"<link rel="alternate canonical" href="/a"><link rel="stylesheet" href="/s.css"><link rel="Canonical" href=" /b ">"#;
        let links = canonical_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/a");
        assert_eq!(links[1].href, "/b");
    }

    #[test]
    fn test_title() {
        assert_eq!(title("<title> Home \n Page </title>").as_deref(), Some("Home Page"));
        assert_eq!(title("<p>none</p>"), None);
    }

    #[test]
    fn test_dom_candidates() {
        let html = r#"
            <a href="/one">1</a>
            <div data-href="/two" data-url="/three"></div>
            <button onclick="window.location = '/four'">Go</button>
            <script>if (x) { document.location='/five'; }</script>
            <script src="/app.js">location.href = '/ignored'</script>
        "#;
        let c = dom_candidates(html);
        assert_eq!(c.hrefs, vec!["/one"]);
        assert_eq!(c.data_attrs, vec!["/two", "/three"]);
        assert_eq!(c.inline_js, vec!["/four", "/five"]);
    }
}
