//! Eviction policies for the recommendation cache
//!
//! Policies only advise: they track keys in their own structure and name a
//! victim when the cache is full. The cache performs the removal. Tracking may
//! lag the cache, so every policy skips tracked keys the cache no longer holds.

mod factory;
mod policies;
mod traits;

pub use factory::{create_eviction_policy, EvictionKind};
pub use policies::{LfuPolicy, LruPolicy, TtlPolicy};
pub use traits::EvictionPolicy;
