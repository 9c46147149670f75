//! Live tracking configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Longest accepted history window: ten years.
pub const MAX_HISTORY_RETENTION_SECS: u64 = 10 * 365 * 86_400;

/// Session and history settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Events buffered per session before new ones are dropped for it
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,

    /// How long location history is kept, in seconds
    #[serde(default = "default_history_retention")]
    pub history_retention_secs: u64,

    /// Upper bound on history records kept per bus
    #[serde(default = "default_history_max_per_bus")]
    pub history_max_per_bus: usize,

    /// Interval between database retention sweeps, in seconds
    #[serde(default = "default_retention_sweep")]
    pub retention_sweep_secs: u64,

    /// Comma-separated bus ids registered at startup when running on the
    /// in-memory store
    pub seed_buses: Option<String>,
}

impl TrackingConfig {
    pub fn retention_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention_sweep_secs)
    }

    pub fn seed_bus_list(&self) -> Vec<String> {
        self.seed_buses
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbox_capacity == 0 {
            return Err(ValidationError::MustBePositive("tracking.outbox_capacity"));
        }
        if self.history_retention_secs == 0 {
            return Err(ValidationError::MustBePositive("tracking.history_retention_secs"));
        }
        if self.history_retention_secs > MAX_HISTORY_RETENTION_SECS {
            return Err(ValidationError::TooLarge {
                field: "tracking.history_retention_secs",
                max: MAX_HISTORY_RETENTION_SECS,
            });
        }
        if self.history_max_per_bus == 0 {
            return Err(ValidationError::MustBePositive("tracking.history_max_per_bus"));
        }
        if self.retention_sweep_secs == 0 {
            return Err(ValidationError::MustBePositive("tracking.retention_sweep_secs"));
        }
        Ok(())
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: default_outbox_capacity(),
            history_retention_secs: default_history_retention(),
            history_max_per_bus: default_history_max_per_bus(),
            retention_sweep_secs: default_retention_sweep(),
            seed_buses: None,
        }
    }
}

fn default_outbox_capacity() -> usize {
    128
}

fn default_history_retention() -> u64 {
    86_400
}

fn default_history_max_per_bus() -> usize {
    1_000
}

fn default_retention_sweep() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackingConfig::default();
        assert_eq!(config.outbox_capacity, 128);
        assert_eq!(config.history_retention_secs, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seed_bus_list_parsing() {
        let config = TrackingConfig {
            seed_buses: Some("B1, B2,,B3 ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.seed_bus_list(), vec!["B1", "B2", "B3"]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = TrackingConfig {
            outbox_capacity: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("tracking.outbox_capacity"))
        );
    }

    #[test]
    fn test_oversized_retention_rejected() {
        for secs in [MAX_HISTORY_RETENTION_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            let config = TrackingConfig {
                history_retention_secs: secs,
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::TooLarge {
                    field: "tracking.history_retention_secs",
                    max: MAX_HISTORY_RETENTION_SECS,
                })
            );
        }

        let config = TrackingConfig {
            history_retention_secs: MAX_HISTORY_RETENTION_SECS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
