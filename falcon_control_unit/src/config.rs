//! TOML configuration for the `falcon_joystick` binary.
//!
//! One file, five sections, every field defaulted:
//!
//! ```toml
//! [shared]
//! log_level = "info"
//!
//! [device]
//! index = 0
//! driver = "simulation"
//!
//! [homing]
//! timeout_s = 120.0
//!
//! [control]
//! debug = false
//! clutch_pressed = true
//! coag_pressed = true
//!
//! [transport]
//! joystick_topic = "/falcon/joystick"
//! ```

use std::path::Path;

use falcon_common::config::{ConfigError, ConfigLoader, SharedConfig};
use falcon_common::control_unit::control::ControlConfig;
use falcon_common::control_unit::homing::HomingConfig;
use falcon_common::hal::config::DeviceConfig;
use falcon_common::telemetry::TransportConfig;
use serde::{Deserialize, Serialize};

/// Complete configuration bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FalconConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub homing: HomingConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl FalconConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.device.validate()?;
        self.homing.validate()?;
        self.control.validate()?;
        self.transport.validate()
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the configuration file at `path`.
///
/// Runs before logging is set up, so it does not log.
pub fn load_config(path: &Path) -> Result<FalconConfig, ConfigError> {
    let config = FalconConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate an in-memory TOML document.
pub fn load_config_from_str(content: &str) -> Result<FalconConfig, ConfigError> {
    let config = FalconConfig::load_str(content)?;
    config.validate()?;
    Ok(config)
}
