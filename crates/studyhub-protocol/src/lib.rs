//! # studyhub-protocol
//!
//! Client for the external protocol-definition source: a version-
//! controlled document store reached over HTTP. Fetches are bounded by a
//! timeout and wrapped in a caching layer that serves the last-known-good
//! document on transient failure, so a transient upstream outage never
//! hard-fails a subject's regeneration.

mod cached;
mod fetcher;
mod source;

pub use cached::CachingProtocolSource;
pub use fetcher::{HttpProtocolFetcher, ProtocolFetcher};
pub use source::ProtocolSource;
