// src/crawl/inventory.rs
// =============================================================================
// Chooses which discovered URLs get analyzed.
//
// The site's root page always comes first. After that, discovered URLs are
// taken in discovery order, skipping anything that is not an analyzable
// page and anything that dedups to a URL already picked. The same input
// always produces the same ordered output.
// =============================================================================

use crate::crawl::normalize::{is_html_candidate, INFRASTRUCTURE_PATH};
use std::collections::HashSet;
use url::Url;

pub struct PageInventory;

impl PageInventory {
    pub fn select(discovered: &[String], site_root: &str, max_pages: usize, hard_cap: usize) -> Vec<String> {
        let limit = max_pages.min(hard_cap);
        let mut selected: Vec<String> = Vec::new();
        let mut keys: HashSet<String> = HashSet::new();

        if limit == 0 {
            return selected;
        }

        let mut add = |raw: &str, selected: &mut Vec<String>| {
            let Some(url) = analyzable(raw) else {
                return;
            };
            if keys.insert(dedup_key(&url)) {
                selected.push(raw.to_string());
            }
        };

        if let Some(homepage) = canonical_homepage(site_root) {
            add(&homepage, &mut selected);
        }

        for raw in discovered {
            if selected.len() >= limit {
                break;
            }
            add(raw, &mut selected);
        }

        selected.truncate(limit);
        selected
    }
}

// `scheme://host[:port]/` or None for non-http(s) roots
fn canonical_homepage(site_root: &str) -> Option<String> {
    let url = Url::parse(site_root).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    })
}

fn analyzable(raw: &str) -> Option<Url> {
    if raw.contains(INFRASTRUCTURE_PATH) {
        return None;
    }
    let url = Url::parse(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str().filter(|h| !h.is_empty())?;
    if url.fragment().is_some() || !is_html_candidate(&url) {
        return None;
    }
    Some(url)
}

// scheme://host{path without trailing slash, root kept}?{query}
fn dedup_key(url: &Url) -> String {
    let mut path = url.path().to_string();
    if path != "/" {
        path = path.trim_end_matches('/').to_string();
        if path.is_empty() {
            path = "/".to_string();
        }
    }
    let host = match url.port() {
        Some(port) => format!("{}:{}", url.host_str().unwrap_or(""), port),
        None => url.host_str().unwrap_or("").to_string(),
    };
    format!(
        "{}://{}{}?{}",
        url.scheme().to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        path,
        url.query().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_homepage_first_and_dedup() {
        let discovered = urls(&[
            "https://example.com/about/",
            "https://example.com/",
            "https://example.com/about",
            "https://example.com/about?lang=ro",
            "https://example.com/file.pdf",
            "https://example.com/x#section",
            "https://example.com/cdn-cgi/l/email-protection",
            "mailto:hi@example.com",
        ]);
        let picked = PageInventory::select(&discovered, "https://example.com", 25, 500);
        assert_eq!(
            picked,
            urls(&[
                "https://example.com/",
                "https://example.com/about/",
                "https://example.com/about?lang=ro",
            ])
        );
    }

    #[test]
    fn test_limit_is_min_of_max_and_cap() {
        let discovered: Vec<String> = (0..50).map(|i| format!("https://example.com/p{i}")).collect();
        assert_eq!(PageInventory::select(&discovered, "https://example.com/", 25, 500).len(), 25);
        assert_eq!(PageInventory::select(&discovered, "https://example.com/", 25, 3).len(), 3);
        assert!(PageInventory::select(&discovered, "https://example.com/", 0, 3).is_empty());
    }

    #[test]
    fn test_select_is_deterministic() {
        let discovered: Vec<String> = (0..40).rev().map(|i| format!("https://example.com/p{i}/")).collect();
        let first = PageInventory::select(&discovered, "https://example.com/", 10, 500);
        let second = PageInventory::select(&discovered, "https://example.com/", 10, 500);
        assert_eq!(first, second);
        assert_eq!(first[0], "https://example.com/");
        assert_eq!(first[1], "https://example.com/p39/");
    }
}
