//! In-memory query cache: keyed storage, staleness tracking, and
//! read-through fetching with per-key request deduplication.

mod layer;
mod memory;
mod traits;

pub use layer::CacheLayer;
pub use memory::{CacheBackend, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, CacheStorage, CachedQuery};
