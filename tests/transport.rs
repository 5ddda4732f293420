// tests/transport.rs
// The reqwest transport against a local wiremock server. The URL carries a
// hostname that does not exist; only the pinned address makes it reachable.

use indexguard::net::{PinnedRequest, ReqwestTransport, Transport};
use indexguard::FetchError;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "indexguard-test/1.0";

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5), USER_AGENT)
}

fn pinned(server: &MockServer, route: &str, max_bytes: usize) -> PinnedRequest {
    let addr: SocketAddr = *server.address();
    PinnedRequest {
        url: Url::parse(&format!("http://pinned.test:{}{}", addr.port(), route)).unwrap(),
        addr,
        max_bytes,
    }
}

#[tokio::test]
async fn test_request_goes_to_the_pinned_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/salon"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .insert_header("x-robots-tag", "noindex")
                .set_body_string("<html><body>salon</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = transport().send(&pinned(&server, "/salon", 1024)).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("X-Robots-Tag"), Some("noindex"));
    assert_eq!(response.body, b"<html><body>salon</body></html>");
}

#[tokio::test]
async fn test_redirects_are_returned_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = transport().send(&pinned(&server, "/old", 1024)).await.unwrap();

    assert_eq!(response.status, 301);
    assert!(response.is_redirect());
    assert_eq!(response.header("location"), Some("/new"));
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_body_over_cap_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
        .mount(&server)
        .await;

    let result = transport().send(&pinned(&server, "/sitemap.xml", 512)).await;

    assert!(matches!(result, Err(FetchError::TooLarge { limit: 512 })));
}

#[tokio::test]
async fn test_body_at_cap_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(512)))
        .mount(&server)
        .await;

    let response = transport().send(&pinned(&server, "/robots.txt", 512)).await.unwrap();

    assert_eq!(response.body.len(), 512);
}
