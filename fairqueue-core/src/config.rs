//! Configuration and validation for the scheduler's own tunables.
//!
//! This is a convenience layer for constructing a [`crate::scheduler::Scheduler`]
//! from a small YAML fixture, in the style of `vakthund_core::config`'s
//! `RuntimeConfig`/`load`. It is not a cluster-wide configuration system: no
//! file-watching, no environment merging, no secrets.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Scheduler tunables, deserializable from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Number of flows (queues) the scheduler will manage.
    pub queue_count: usize,

    /// Maximum number of requests the downstream server runs at once (`C`).
    pub concurrency_limit: u64,

    /// Virtual service-time estimate per request, in nanoseconds (`G`).
    #[serde(default = "default_service_time_estimate_ns")]
    pub service_time_estimate_ns: f64,
}

fn default_service_time_estimate_ns() -> f64 {
    100_000.0 // 100 microseconds
}

impl SchedulerConfig {
    /// Validates the tunables, returning a `ConfigError` describing the
    /// first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_count == 0 {
            return Err(ConfigError::Validation(
                "queue_count must be at least 1".into(),
            ));
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Validation(
                "concurrency_limit must be positive".into(),
            ));
        }
        if self.service_time_estimate_ns <= 0.0 {
            return Err(ConfigError::Validation(
                "service_time_estimate_ns must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a YAML file on disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
