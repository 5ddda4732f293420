// src/net/mod.rs
// =============================================================================
// SSRF-safe HTTP layer.
//
// - guard: URL validation, address classification, DNS pinning
// - resolver: the DNS seam (system or static)
// - transport: one pinned request with a streamed byte cap
// - client: redirect walking, header redaction, page traces
// =============================================================================

pub mod client;
pub mod guard;
pub mod resolver;
pub mod transport;

pub use client::{FetchResponse, GuardedHttpClient, PageFetch, RedirectHop};
pub use guard::{AddressSafety, ResolvedAddress, UnsafeRange};
pub use resolver::{Resolver, StaticResolver, SystemResolver};
pub use transport::{PinnedRequest, RawResponse, ReqwestTransport, Transport};
