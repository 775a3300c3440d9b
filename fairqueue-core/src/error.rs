//! Error types for the scheduler core and its configuration surface.

use thiserror::Error;

/// Errors raised by [`crate::config::SchedulerConfig`] loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the scheduler core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `enqueue`/`finish` referenced a queue index outside `[0, queue_count)`.
    #[error("queue index {queue_idx} out of range (queue_count = {queue_count})")]
    InvalidQueue { queue_idx: usize, queue_count: usize },

    /// Construction-time or reload-time configuration was invalid.
    #[error("invalid scheduler configuration: {0}")]
    Config(#[from] ConfigError),
}
