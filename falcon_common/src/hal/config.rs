//! HAL configuration types.
//!
//! - `DeviceConfig` - `[device]` section: which device, which backend, firmware
//! - `SimulationConfig` - `[device.simulation]` section for the software Falcon

use crate::config::ConfigError;
use crate::consts::{DEFAULT_DEVICE_INDEX, FIRMWARE_LOAD_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_device_index() -> u32 {
    DEFAULT_DEVICE_INDEX
}

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_firmware_attempts() -> u32 {
    FIRMWARE_LOAD_ATTEMPTS
}

/// `[device]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Index of the device to open (0 = first Falcon).
    #[serde(default = "default_device_index")]
    pub index: u32,

    /// Registered driver backend name.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Firmware image to upload when none is resident.
    #[serde(default)]
    pub firmware_path: Option<PathBuf>,

    /// Load attempts before bring-up fails.
    #[serde(default = "default_firmware_attempts")]
    pub firmware_attempts: u32,

    /// Skip the firmware checksum check during upload.
    #[serde(default)]
    pub skip_checksum: bool,

    /// Settings for the `simulation` backend.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            index: default_device_index(),
            driver: default_driver(),
            firmware_path: None,
            firmware_attempts: default_firmware_attempts(),
            skip_checksum: false,
            simulation: SimulationConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Validate the device section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "device.driver cannot be empty".to_string(),
            ));
        }
        if self.firmware_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "device.firmware_attempts must be at least 1".to_string(),
            ));
        }
        self.simulation.validate()
    }
}

fn default_device_count() -> u32 {
    1
}
fn default_homing_cycles() -> u32 {
    50
}
fn default_hand_position() -> [f64; 3] {
    [0.0, 0.0, 0.11]
}
fn default_hand_stiffness() -> Option<f64> {
    Some(5000.0)
}
fn default_workspace_limit() -> f64 {
    0.06
}

/// `[device.simulation]` section.
///
/// The simulated grip is held by a compliant hand: each exchange the grip
/// settles at `hand + force / hand_stiffness`, clamped to the workspace box
/// of half-extent `workspace_limit` around `hand_position`.
/// A missing `hand_stiffness` models a rigid hand (grip exactly at `hand`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Devices visible on the simulated bus.
    #[serde(default = "default_device_count")]
    pub device_count: u32,

    /// Firmware already resident at open.
    #[serde(default)]
    pub firmware_resident: bool,

    /// Upload attempts that fail before one succeeds.
    #[serde(default)]
    pub firmware_failures: u32,

    /// Encoders already homed at open.
    #[serde(default)]
    pub homed_at_start: bool,

    /// Exchanges in homing mode before the encoders report homed.
    #[serde(default = "default_homing_cycles")]
    pub homing_cycles: u32,

    /// Fail every Nth exchange with an I/O error (0 = never).
    #[serde(default)]
    pub io_fault_every: u32,

    /// Initial hand (rest) position.
    #[serde(default = "default_hand_position")]
    pub hand_position: [f64; 3],

    /// Hand compliance [force units per device unit].
    #[serde(default = "default_hand_stiffness")]
    pub hand_stiffness: Option<f64>,

    /// Workspace half-extent around `hand_position` on each axis.
    #[serde(default = "default_workspace_limit")]
    pub workspace_limit: f64,

    /// Radius of a slow circular hand motion in the x/y plane (0 = still).
    #[serde(default)]
    pub orbit_radius: f64,

    /// Orbit phase advance per exchange [rad].
    #[serde(default)]
    pub orbit_step_rad: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_count: default_device_count(),
            firmware_resident: false,
            firmware_failures: 0,
            homed_at_start: false,
            homing_cycles: default_homing_cycles(),
            io_fault_every: 0,
            hand_position: default_hand_position(),
            hand_stiffness: default_hand_stiffness(),
            workspace_limit: default_workspace_limit(),
            orbit_radius: 0.0,
            orbit_step_rad: 0.0,
        }
    }
}

impl SimulationConfig {
    /// Validate the simulation section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(k) = self.hand_stiffness
            && !(k.is_finite() && k > 0.0)
        {
            return Err(ConfigError::ValidationError(format!(
                "device.simulation.hand_stiffness must be positive, got {k}"
            )));
        }
        if !(self.workspace_limit.is_finite() && self.workspace_limit > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "device.simulation.workspace_limit must be positive, got {}",
                self.workspace_limit
            )));
        }
        if self.hand_position.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::ValidationError(
                "device.simulation.hand_position must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
