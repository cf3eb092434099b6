//! Configuration for the job scheduler
//!
//! Defines how long finished jobs are kept and how often they are swept.

use crate::SchedulerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the priority manager and its sweeper
///
/// # Examples
///
/// ```
/// use redyce_scheduler::SchedulerConfig;
///
/// // Default: finished jobs kept one hour, swept every five minutes
/// let config = SchedulerConfig::default();
/// assert_eq!(config.retention_secs, 3600);
///
/// // Aggressive: shorter retention, frequent sweeps
/// let config = SchedulerConfig::aggressive();
/// assert_eq!(config.retention_secs, 600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How long a COMPLETED/ERROR/CANCELLED job stays queryable (seconds)
    /// Default: 3600 (one hour)
    pub retention_secs: u64,

    /// How often the sweeper evicts expired jobs (seconds)
    /// Default: 300
    pub sweep_interval_secs: u64,

    /// Capacity of the job event channel; slow subscribers lag past it
    /// Default: 256
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
            sweep_interval_secs: 300,
            event_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    /// Aggressive preset: ten minutes of retention, sweeps every minute
    pub fn aggressive() -> Self {
        Self {
            retention_secs: 600,
            sweep_interval_secs: 60,
            event_capacity: 256,
        }
    }

    /// Lenient preset: a day of retention, sweeps every half hour
    pub fn lenient() -> Self {
        Self {
            retention_secs: 86_400,
            sweep_interval_secs: 1800,
            event_capacity: 1024,
        }
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Get retention as Duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.sweep_interval_secs == 0 {
            return Err(SchedulerError::Config(
                "sweep_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(SchedulerError::Config(
                "event_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, SchedulerError> {
        toml::from_str(toml_str)
            .map_err(|e| SchedulerError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, SchedulerError> {
        toml::to_string_pretty(self)
            .map_err(|e| SchedulerError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
