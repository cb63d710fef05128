//! Eviction policy implementations

mod lfu;
mod lru;
mod ttl;

pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use ttl::TtlPolicy;
