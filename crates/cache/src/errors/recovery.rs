//! Recovery utilities for advisor errors

use super::types::{AdvisorError, RecoveryHint};

impl AdvisorError {
    /// Get the recovery hint for this error
    #[must_use]
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Self::InvalidConfiguration { field, .. } => {
                RecoveryHint::UpdateConfiguration { field: *field }
            }
            Self::InvalidTtl { .. } => RecoveryHint::UpdateConfiguration {
                field: "default_ttl",
            },
            Self::UnknownEvictionPolicy { .. } => RecoveryHint::UseDefault {
                value: "lru".to_string(),
            },
            Self::ConfigIo { path, .. } => RecoveryHint::CheckPermissions { path: path.clone() },
            Self::ConfigParse { .. } => RecoveryHint::Manual {
                instructions: "Check config file syntax".to_string(),
            },
        }
    }

    /// Check if this error was caused by the caller supplying bad values
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. }
                | Self::InvalidTtl { .. }
                | Self::UnknownEvictionPolicy { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unknown_policy_suggests_lru() {
        let err = AdvisorError::UnknownEvictionPolicy {
            name: "mru".to_string(),
        };
        assert_eq!(
            err.recovery_hint(),
            RecoveryHint::UseDefault {
                value: "lru".to_string()
            }
        );
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "unknown eviction policy 'mru'");
    }

    #[test]
    fn test_invalid_ttl_is_caller_error() {
        let err = AdvisorError::InvalidTtl {
            ttl: Duration::ZERO,
        };
        assert!(err.is_configuration());
        assert!(matches!(
            err.recovery_hint(),
            RecoveryHint::UpdateConfiguration { .. }
        ));
    }
}
