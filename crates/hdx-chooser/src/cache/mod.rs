//! Catalog response caching
//!
//! - `keys`: normalized request signatures
//! - `response`: append-only response cache
//! - `inflight`: coalescing of identical outstanding requests
//! - `catalog`: the cached, typed catalog handle used by the navigator

pub mod catalog;
pub mod inflight;
pub mod keys;
pub mod response;

pub use catalog::{CachedCatalog, DEFAULT_CALL_TIMEOUT};
pub use inflight::{Claim, Follower, InFlightLedger, LeaderGuard};
pub use keys::RequestSignature;
pub use response::{CacheStats, ResponseCache};
