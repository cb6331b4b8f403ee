//! Real-time sync configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::sync::{ReaperConfig, MIN_CHANNEL_CAPACITY};
use crate::domain::foundation::Amount;

use super::error::ValidationError;

/// Settings for the viewer feed and goal tracking
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Seconds between inactivity sweeps
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_secs: u64,

    /// Idle seconds after which a viewer is evicted
    #[serde(default = "default_max_idle")]
    pub max_idle_secs: u64,

    /// Outbound queue depth per viewer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Savings target in monetary units
    #[serde(default = "default_savings_goal")]
    pub savings_goal: f64,
}

impl SyncConfig {
    pub fn reaper_config(&self) -> ReaperConfig {
        ReaperConfig::default()
            .with_interval(Duration::from_secs(self.reaper_interval_secs))
            .with_max_idle(Duration::from_secs(self.max_idle_secs))
    }

    /// Savings goal as a validated amount
    pub fn goal(&self) -> Result<Amount, ValidationError> {
        Amount::from_units(self.savings_goal)
            .ok()
            .filter(Amount::is_positive)
            .ok_or(ValidationError::InvalidSavingsGoal)
    }

    /// Validate sync configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reaper_interval_secs == 0 || self.max_idle_secs == 0 {
            return Err(ValidationError::InvalidReaperTiming);
        }
        if self.channel_capacity < MIN_CHANNEL_CAPACITY {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        self.goal()?;
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reaper_interval_secs: default_reaper_interval(),
            max_idle_secs: default_max_idle(),
            channel_capacity: default_channel_capacity(),
            savings_goal: default_savings_goal(),
        }
    }
}

fn default_reaper_interval() -> u64 {
    600
}

fn default_max_idle() -> u64 {
    1800
}

fn default_channel_capacity() -> usize {
    128
}

fn default_savings_goal() -> f64 {
    10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::savings::DEFAULT_SAVINGS_GOAL;

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.reaper_interval_secs, 600);
        assert_eq!(config.max_idle_secs, 1800);
        assert_eq!(config.channel_capacity, 128);
        assert_eq!(config.goal().unwrap(), DEFAULT_SAVINGS_GOAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reaper_config_conversion() {
        let config = SyncConfig {
            reaper_interval_secs: 5,
            max_idle_secs: 60,
            ..Default::default()
        };
        let reaper = config.reaper_config();
        assert_eq!(reaper.interval, Duration::from_secs(5));
        assert_eq!(reaper.max_idle, Duration::from_secs(60));
    }

    #[test]
    fn test_validation_zero_interval() {
        let config = SyncConfig {
            reaper_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidReaperTiming));
    }

    #[test]
    fn test_validation_capacity_below_welcome_depth() {
        for channel_capacity in [0, 1] {
            let config = SyncConfig {
                channel_capacity,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidChannelCapacity));
        }

        let config = SyncConfig {
            channel_capacity: 2,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_non_positive_goal() {
        for goal in [0.0, -50.0, f64::NAN] {
            let config = SyncConfig {
                savings_goal: goal,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidSavingsGoal));
        }
    }
}
