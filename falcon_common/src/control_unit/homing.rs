//! Homing types for the Control Unit.
//!
//! Defines `HomingStatus` and the `[homing]` configuration section.

use crate::config::ConfigError;
use crate::consts::MAX_HOMING_TIMEOUT_S;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Encoder homing lifecycle. `Homed` is terminal for a process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum HomingStatus {
    /// Device opened, encoders not homed yet.
    #[default]
    NotHomed = 0,
    /// Operator asked to move the grip through its range.
    Homing = 1,
    /// Encoders homed; control loop may start.
    Homed = 2,
}

impl HomingStatus {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotHomed),
            1 => Some(Self::Homing),
            2 => Some(Self::Homed),
            _ => None,
        }
    }
}

fn default_homing_timeout() -> f64 {
    120.0
}
fn default_poll_interval_ms() -> u64 {
    1
}
fn default_settle_ms() -> u64 {
    100
}

/// `[homing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomingConfig {
    /// Give up waiting for the operator after this long [s].
    #[serde(default = "default_homing_timeout")]
    pub timeout_s: f64,
    /// Pause between homing polls [ms].
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pause after enabling homing mode, before polling [ms].
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            timeout_s: default_homing_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl HomingConfig {
    /// Homing deadline as a `Duration`. Out-of-range values saturate.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_s).unwrap_or(Duration::MAX)
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle delay as a `Duration`.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Validate the homing section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timeout_s.is_finite()
            && self.timeout_s > 0.0
            && self.timeout_s <= MAX_HOMING_TIMEOUT_S)
        {
            return Err(ConfigError::ValidationError(format!(
                "homing.timeout_s must be in (0, {MAX_HOMING_TIMEOUT_S}], got {}",
                self.timeout_s
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homing_status_roundtrip() {
        for v in 0..=2u8 {
            let status = HomingStatus::from_u8(v).unwrap();
            assert_eq!(status as u8, v);
        }
        assert!(HomingStatus::from_u8(3).is_none());
        assert_eq!(HomingStatus::default(), HomingStatus::NotHomed);
    }

    #[test]
    fn homing_config_defaults() {
        let config: HomingConfig = toml::from_str("").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.settle(), Duration::from_millis(100));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn homing_config_rejects_non_positive_timeout() {
        let config = HomingConfig {
            timeout_s: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn homing_config_rejects_unbounded_timeout() {
        for timeout_s in [1e20, MAX_HOMING_TIMEOUT_S + 1.0, f64::INFINITY] {
            let config = HomingConfig {
                timeout_s,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "timeout {timeout_s} accepted"
            );
            // Unvalidated values still convert without panicking.
            assert!(config.timeout() >= Duration::from_secs(3600));
        }

        let longest = HomingConfig {
            timeout_s: MAX_HOMING_TIMEOUT_S,
            ..Default::default()
        };
        assert!(longest.validate().is_ok());
    }
}
