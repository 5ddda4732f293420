// src/signals/important.rs
// =============================================================================
// Picks the pages a small business site cannot afford to lose from search.
//
// Everything comes from the homepage's own links. An internal link (same
// host and port as the homepage) lands in a group when a keyword appears in
// its lower-cased text or href:
//
//   booking   first matching link
//   contact   first matching link
//   services  up to 5 links, shallowest path first, then link order
//   pricing   first matching link
//
// Keywords cover English and Romanian. Matching is plain substring search.
//
// "Primary" pages are the ones whose problems are escalated to fail: the
// homepage, the first booking and contact links and every services link.
// =============================================================================

use crate::crawl::normalize::{normalize_url, same_page};
use crate::signals::html::anchors;
use serde::Serialize;
use url::Url;

const MAX_SERVICE_LINKS: usize = 5;

const BOOKING_KEYWORDS: &[&str] = &[
    "book", "booking", "appointment", "schedule", "reserve", "programeaza", "programează",
    "programare", "programări", "rezervare", "rezerva", "rezervă",
];

const CONTACT_KEYWORDS: &[&str] = &[
    "contact", "call", "phone", "email", "location", "contacteaza", "contactează", "telefon",
    "adresa", "adresă", "locatie", "locație",
];

const SERVICES_KEYWORDS: &[&str] = &[
    "services", "servicii", "tuns", "vopsit", "manichiura", "manichiură", "pedichiura",
    "pedichiură", "coafat", "tratament", "abonament", "abonamente", "membership",
];

const PRICING_KEYWORDS: &[&str] = &[
    "lei", "ron", "€", "eur", "price", "pret", "preț", "preturi", "prețuri", "tarif", "tarife",
];

// An internal homepage link ready for keyword matching
struct Link {
    url: String,
    haystack: String,
    depth: usize,
    order: usize,
}

/// Important URLs grouped by why they matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportantPages {
    pub homepage: String,
    pub booking: Vec<String>,
    pub contact: Vec<String>,
    pub services: Vec<String>,
    pub pricing: Vec<String>,
}

impl ImportantPages {
    // Classifies the links of the homepage HTML. `homepage` is where the
    // homepage fetch ended up; relative links resolve against it.
    pub fn from_homepage(homepage: &Url, html: &str) -> Self {
        let links: Vec<Link> = anchors(html)
            .into_iter()
            .filter_map(|anchor| {
                let url = normalize_url(&anchor.href, homepage)?;
                if url.host_str() != homepage.host_str() || url.port() != homepage.port() {
                    return None;
                }
                let depth = url.path().split('/').filter(|s| !s.is_empty()).count();
                let url = String::from(url);
                Some((url, anchor.text, depth))
            })
            .enumerate()
            .map(|(order, (url, text, depth))| Link {
                haystack: format!("{} {}", text.to_lowercase(), url.to_lowercase()),
                url,
                depth,
                order,
            })
            .collect();

        Self {
            homepage: homepage.to_string(),
            booking: first_match(&links, BOOKING_KEYWORDS),
            contact: first_match(&links, CONTACT_KEYWORDS),
            services: service_links(&links),
            pricing: first_match(&links, PRICING_KEYWORDS),
        }
    }

    // homepage, booking, contact, services, pricing; duplicates dropped
    pub fn urls(&self) -> Vec<String> {
        let mut ordered: Vec<String> = Vec::new();
        let all = std::iter::once(&self.homepage)
            .chain(&self.booking)
            .chain(&self.contact)
            .chain(&self.services)
            .chain(&self.pricing);
        for url in all {
            if !ordered.contains(url) {
                ordered.push(url.clone());
            }
        }
        ordered
    }

    pub fn primary(&self) -> Vec<String> {
        let mut primary = vec![self.homepage.clone()];
        primary.extend(self.booking.first().cloned());
        primary.extend(self.contact.first().cloned());
        for url in &self.services {
            if !primary.contains(url) {
                primary.push(url.clone());
            }
        }
        primary
    }

    // Trailing-slash and scheme differences still count as the same page
    pub fn is_important(&self, url: &str) -> bool {
        self.urls().iter().any(|u| same_page(u, url))
    }

    pub fn is_primary(&self, url: &str) -> bool {
        self.primary().iter().any(|u| same_page(u, url))
    }
}

fn matches(link: &Link, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| link.haystack.contains(k))
}

fn first_match(links: &[Link], keywords: &[&str]) -> Vec<String> {
    links
        .iter()
        .find(|link| matches(link, keywords))
        .map(|link| vec![link.url.clone()])
        .unwrap_or_default()
}

fn service_links(links: &[Link]) -> Vec<String> {
    let mut candidates: Vec<&Link> = links.iter().filter(|l| matches(l, SERVICES_KEYWORDS)).collect();
    candidates.sort_by_key(|l| (l.depth, l.order));

    let mut out: Vec<String> = Vec::new();
    for link in candidates {
        if out.len() >= MAX_SERVICE_LINKS {
            break;
        }
        if !out.contains(&link.url) {
            out.push(link.url.clone());
        }
    }
    out
}
