//! [`JsonCache`](fanalyzer_core::cache::JsonCache) backends.
//!
//! - [`MokaCache`]: in-process, bounded, per-entry expiry.
//! - [`RedisCache`]: shared across server instances, keys namespaced by a
//!   prefix.
//! - [`NullCache`]: caches nothing; every read is a miss.

mod memory;
mod null;
mod redis;

pub mod error;

pub use error::{Error, Result};
pub use memory::MokaCache;
pub use null::NullCache;
pub use self::redis::RedisCache;
