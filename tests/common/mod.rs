// tests/common/mod.rs
// Shared fixtures: an in-memory site behind a static resolver.

#![allow(dead_code)]

use async_trait::async_trait;
use indexguard::error::FetchError;
use indexguard::net::{GuardedHttpClient, PinnedRequest, RawResponse, StaticResolver, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PUBLIC_IP: &str = "93.184.216.34";

/// Serves canned responses by exact URL and counts every request.
#[derive(Default)]
pub struct MapTransport {
    responses: HashMap<String, RawResponse>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MapTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, response: RawResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requested().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl Transport for MapTransport {
    async fn send(&self, request: &PinnedRequest) -> Result<RawResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(request.url.to_string());
        Ok(self.responses.get(request.url.as_str()).cloned().unwrap_or(RawResponse {
            status: 404,
            headers: vec![("content-type".into(), "text/html".into())],
            body: b"<html><body>not found</body></html>".to_vec(),
        }))
    }
}

pub fn html(body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        headers: vec![("Content-Type".into(), "text/html; charset=utf-8".into())],
        body: body.as_bytes().to_vec(),
    }
}

pub fn text(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        headers: vec![("Content-Type".into(), "text/plain".into())],
        body: body.as_bytes().to_vec(),
    }
}

pub fn xml(body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        headers: vec![("Content-Type".into(), "application/xml".into())],
        body: body.as_bytes().to_vec(),
    }
}

pub fn redirect(status: u16, location: &str) -> RawResponse {
    RawResponse {
        status,
        headers: vec![("Location".into(), location.into())],
        body: Vec::new(),
    }
}

/// Resolver mapping every listed host to the public test address.
pub fn resolver(hosts: &[&str]) -> StaticResolver {
    hosts
        .iter()
        .fold(StaticResolver::new(), |r, host| r.with(host, &[PUBLIC_IP]))
}

pub fn client(transport: Arc<MapTransport>, resolver: StaticResolver) -> GuardedHttpClient {
    GuardedHttpClient::new(Arc::new(resolver), transport, 10)
}
