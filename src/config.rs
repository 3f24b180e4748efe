//! Configuration management for the rate limiter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{FloodgateError, Result};

/// Tunable parameters for a [`RateLimiter`](crate::ratelimit::RateLimiter).
///
/// Each limiter instance carries its own configuration; there is no
/// process-wide shared state between instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum admitted requests per key per window
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Fixed-window duration in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Idle time in seconds before an entry is swept
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// How often the background sweep runs, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_limit() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl RateLimiterConfig {
    /// The fixed-window duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// How long a key may go unchecked before it is eligible for eviction.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// The period of the background sweep.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Check that every parameter is usable.
    ///
    /// Called at limiter construction so misconfiguration surfaces before
    /// any state is built.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(FloodgateError::Config(
                "limit must be greater than zero".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(FloodgateError::Config(
                "window_secs must be greater than zero".to_string(),
            ));
        }
        if self.idle_timeout_secs == 0 {
            return Err(FloodgateError::Config(
                "idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(FloodgateError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limiter configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            FloodgateError::Config(format!("Failed to parse rate limiter config: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.limit, 5);
        assert_eq!(config.window(), Duration::from_secs(60));
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml_fills_defaults() {
        let yaml = r#"
limit: 100
window_secs: 1
"#;
        let config = RateLimiterConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.limit, 100);
        assert_eq!(config.window_secs, 1);
        assert_eq!(config.idle_timeout_secs, 600);
        assert_eq!(config.sweep_interval_secs, 300);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = RateLimiterConfig::from_yaml("limit: [not a number]");
        assert!(matches!(result, Err(FloodgateError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let config = RateLimiterConfig {
            limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        for field in 0..3 {
            let mut config = RateLimiterConfig::default();
            match field {
                0 => config.window_secs = 0,
                1 => config.idle_timeout_secs = 0,
                _ => config.sweep_interval_secs = 0,
            }
            assert!(config.validate().is_err());
        }
    }
}
