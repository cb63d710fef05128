//! Factory for creating eviction policies

use crate::errors::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::policies::{LfuPolicy, LruPolicy, TtlPolicy};
use super::traits::EvictionPolicy;

/// Available eviction strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionKind {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used
    Lfu,
    /// Earliest expiry first
    Ttl,
}

impl FromStr for EvictionKind {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "ttl" => Ok(Self::Ttl),
            _ => Err(AdvisorError::UnknownEvictionPolicy {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EvictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::Ttl => "ttl",
        };
        f.write_str(name)
    }
}

/// Eviction policy factory
pub fn create_eviction_policy(kind: EvictionKind) -> Box<dyn EvictionPolicy> {
    match kind {
        EvictionKind::Lru => Box::new(LruPolicy::new()),
        EvictionKind::Lfu => Box::new(LfuPolicy::new()),
        EvictionKind::Ttl => Box::new(TtlPolicy::new()),
    }
}
