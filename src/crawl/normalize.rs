// src/crawl/normalize.rs
// =============================================================================
// URL helpers shared by every discovery source.
//
// All candidates (sitemap locs, BFS anchors, rendered links) pass through
// the same three checks before they can enter the discovered list:
// - normalize: resolve, http(s) only, lower-case host, drop default port,
//   empty path -> "/", drop fragment, keep query
// - same host as the site root, ignoring a leading "www."
// - HTML candidate: no asset extension, not an infrastructure path
// =============================================================================

use url::Url;

// Extensions that are HTML (or extensionless) pages
const HTML_EXTENSIONS: [&str; 6] = ["html", "htm", "php", "asp", "aspx", "jsp"];

// Extensions that are never worth fetching as pages
const ASSET_EXTENSIONS: [&str; 42] = [
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "css", "js", "mjs", "map", "pdf", "zip",
    "rar", "7z", "gz", "mp4", "mp3", "wav", "avi", "mov", "wmv", "webm", "woff", "woff2", "ttf",
    "otf", "eot", "xml", "json", "txt", "csv", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "apk",
    "exe", "dmg", "pkg",
];

/// Path segment used by CDN edge tooling (email obfuscation, challenges).
pub const INFRASTRUCTURE_PATH: &str = "/cdn-cgi/";

// Resolves `raw` against `base` and normalizes the result.
//
// Returns None for anything that is not an absolute http(s) URL with a host
// once resolved (mailto:, tel:, javascript:, empty strings, ...).
pub fn normalize_url(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut url = base.join(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str().filter(|h| !h.is_empty())?;

    // The url crate already lower-cases hosts and drops default ports for
    // special schemes; fragments and empty paths are ours to handle
    url.set_fragment(None);
    if url.path().is_empty() {
        url.set_path("/");
    }
    Some(url)
}

// Same as normalize_url but for a string base; used by callers holding text
pub fn normalize_str(raw: &str, base: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    normalize_url(raw, &base).map(String::from)
}

// Host comparison key: lower-case, without a leading "www."
pub fn host_key(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

pub fn same_host(url: &Url, site_root: &Url) -> bool {
    match (url.host_str(), site_root.host_str()) {
        (Some(a), Some(b)) => host_key(a) == host_key(b),
        _ => false,
    }
}

pub fn is_infrastructure(url: &Url) -> bool {
    url.as_str().contains(INFRASTRUCTURE_PATH)
}

// True when the last path segment has no extension or an HTML one
pub fn is_html_candidate(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    let last = path.rsplit('/').next().unwrap_or("");
    let ext = match last.rfind('.') {
        // ".htaccess"-style names have no extension
        Some(0) | None => return true,
        Some(pos) => &last[pos + 1..],
    };

    if ASSET_EXTENSIONS.contains(&ext) {
        return false;
    }
    HTML_EXTENSIONS.contains(&ext)
}

// The full discovery filter: normalized, same host, page-like
pub fn accept_candidate(raw: &str, base: &Url, site_root: &Url) -> Option<String> {
    let url = normalize_url(raw, base)?;
    if !same_host(&url, site_root) || is_infrastructure(&url) || !is_html_candidate(&url) {
        return None;
    }
    Some(url.into())
}

// Same lower-cased host[:port] and same path ignoring trailing slashes.
// Scheme and query are not compared. Unparsable input never matches.
pub fn same_page(a: &str, b: &str) -> bool {
    let (Ok(a), Ok(b)) = (Url::parse(a), Url::parse(b)) else {
        return false;
    };
    page_key(&a) == page_key(&b)
}

fn page_key(url: &Url) -> (String, Option<u16>, String) {
    (
        url.host_str().unwrap_or("").to_ascii_lowercase(),
        url.port(),
        url.path().trim_end_matches('/').to_string(),
    )
}

// `scheme://host[:port]/` for any parsed URL
pub fn site_root(url: &Url) -> Option<Url> {
    let mut root = url.clone();
    root.host_str()?;
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    Some(root)
}
