//! Advisor configuration with precedence and validation
use crate::errors::{AdvisorError, Result};
use crate::eviction::EvictionKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "DISPATCH_ADVISOR_CONFIG";

const ENV_CACHE_CAPACITY: &str = "DISPATCH_ADVISOR_CACHE_CAPACITY";
const ENV_DEFAULT_TTL_SECS: &str = "DISPATCH_ADVISOR_DEFAULT_TTL_SECS";
const ENV_STALENESS_SECS: &str = "DISPATCH_ADVISOR_STALENESS_SECS";
const ENV_PREDICTION_CAPACITY: &str = "DISPATCH_ADVISOR_PREDICTION_CAPACITY";
const ENV_EVICTION_POLICY: &str = "DISPATCH_ADVISOR_EVICTION_POLICY";
const ENV_CLEANUP_INTERVAL_SECS: &str = "DISPATCH_ADVISOR_CLEANUP_INTERVAL_SECS";

/// Scalar settings supplied at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Maximum cached recommendations
    pub cache_capacity: usize,
    /// TTL applied by the advisor when caching a fresh recommendation
    pub default_ttl: Duration,
    /// Idle time after which a request type's analytics are removed
    pub staleness_window: Duration,
    /// Maximum queued prediction results
    pub prediction_capacity: usize,
    /// Recent execution samples kept per request type
    pub recent_sample_capacity: usize,
    pub eviction_policy: EvictionKind,
    /// Background sweep period; zero disables the background task
    pub cleanup_interval: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            default_ttl: Duration::from_secs(300), // 5 minutes
            staleness_window: Duration::from_secs(3600), // 1 hour
            prediction_capacity: 1000,
            recent_sample_capacity: 100,
            eviction_policy: EvictionKind::Lru,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl AdvisorConfig {
    /// Reject values that would break cache or queue invariants
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(AdvisorError::invalid_configuration(
                "cache_capacity",
                "must be at least 1",
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(AdvisorError::invalid_configuration(
                "default_ttl",
                "must be greater than zero",
            ));
        }
        if self.staleness_window.is_zero() {
            return Err(AdvisorError::invalid_configuration(
                "staleness_window",
                "must be greater than zero",
            ));
        }
        if self.prediction_capacity == 0 {
            return Err(AdvisorError::invalid_configuration(
                "prediction_capacity",
                "must be at least 1",
            ));
        }
        if self.recent_sample_capacity == 0 {
            return Err(AdvisorError::invalid_configuration(
                "recent_sample_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::new()
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variables
    Environment,
}

/// Builder for creating advisor configurations
#[derive(Debug, Clone, Default)]
pub struct AdvisorConfigBuilder {
    config: AdvisorConfig,
}

impl AdvisorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.config.staleness_window = window;
        self
    }

    pub fn with_prediction_capacity(mut self, capacity: usize) -> Self {
        self.config.prediction_capacity = capacity;
        self
    }

    pub fn with_recent_sample_capacity(mut self, capacity: usize) -> Self {
        self.config.recent_sample_capacity = capacity;
        self
    }

    pub fn with_eviction_policy(mut self, kind: EvictionKind) -> Self {
        self.config.eviction_policy = kind;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Partial configuration as read from a file or the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct ConfigOverrides {
    cache_capacity: Option<usize>,
    default_ttl_secs: Option<u64>,
    staleness_secs: Option<u64>,
    prediction_capacity: Option<usize>,
    recent_sample_capacity: Option<usize>,
    eviction_policy: Option<EvictionKind>,
    cleanup_interval_secs: Option<u64>,
}

impl ConfigOverrides {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(self, config: &mut AdvisorConfig) {
        if let Some(capacity) = self.cache_capacity {
            config.cache_capacity = capacity;
        }
        if let Some(secs) = self.default_ttl_secs {
            config.default_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = self.staleness_secs {
            config.staleness_window = Duration::from_secs(secs);
        }
        if let Some(capacity) = self.prediction_capacity {
            config.prediction_capacity = capacity;
        }
        if let Some(capacity) = self.recent_sample_capacity {
            config.recent_sample_capacity = capacity;
        }
        if let Some(kind) = self.eviction_policy {
            config.eviction_policy = kind;
        }
        if let Some(secs) = self.cleanup_interval_secs {
            config.cleanup_interval = Duration::from_secs(secs);
        }
    }
}

/// Configuration loader that handles precedence
pub struct AdvisorConfigLoader;

impl AdvisorConfigLoader {
    /// Load configuration: defaults, then config file, then environment
    pub fn load() -> Result<(AdvisorConfig, ConfigSource)> {
        let mut config = AdvisorConfig::default();
        let mut source = ConfigSource::Default;

        if let Some(path) = Self::config_file_path() {
            if path.exists() {
                Self::read_file(&path)?.apply(&mut config);
                source = ConfigSource::ConfigFile(path);
            }
        }

        let env = Self::from_env()?;
        if !env.is_empty() {
            env.apply(&mut config);
            source = ConfigSource::Environment;
        }

        config.validate()?;
        Ok((config, source))
    }

    /// Load a configuration file on top of the defaults
    pub fn load_file(path: &Path) -> Result<AdvisorConfig> {
        let mut config = AdvisorConfig::default();
        Self::read_file(path)?.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigOverrides> {
        let content = std::fs::read_to_string(path).map_err(|source| AdvisorError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| AdvisorError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_env() -> Result<ConfigOverrides> {
        let eviction_policy = match std::env::var(ENV_EVICTION_POLICY) {
            Ok(name) => Some(name.parse::<EvictionKind>()?),
            Err(_) => None,
        };

        Ok(ConfigOverrides {
            cache_capacity: env_number(ENV_CACHE_CAPACITY),
            default_ttl_secs: env_number(ENV_DEFAULT_TTL_SECS),
            staleness_secs: env_number(ENV_STALENESS_SECS),
            prediction_capacity: env_number(ENV_PREDICTION_CAPACITY),
            recent_sample_capacity: None,
            eviction_policy,
            cleanup_interval_secs: env_number(ENV_CLEANUP_INTERVAL_SECS),
        })
    }

    /// `$DISPATCH_ADVISOR_CONFIG`, else `<config dir>/dispatch-advisor/config.json`
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("dispatch-advisor").join("config.json"))
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring non-numeric override");
            None
        }
    }
}
