//! Startup error type.
//!
//! Every failure before the control loop starts is fatal: the binary logs
//! it and exits with status 1 without publishing anything.

use falcon_common::config::ConfigError;
use falcon_common::hal::driver::LinkError;
use std::time::Duration;
use thiserror::Error;

/// Failure during bring-up (configuration, device open, firmware, homing).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartupError {
    /// Device link failure (open, firmware).
    #[error("device link: {0}")]
    Link(#[from] LinkError),

    /// Operator did not home the device in time.
    #[error("homing not completed after {elapsed:?}")]
    HomingTimeout {
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// Shutdown requested while homing.
    #[error("homing cancelled by shutdown request")]
    Cancelled,

    /// Invalid configuration.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}
