//! Prelude module for common re-exports.
//!
//! `use falcon_common::prelude::*;` brings in the data model, the driver
//! trait and the configuration types.
//!
//! # Usage
//!
//! ```rust
//! use falcon_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_LOOP_RATE_HZ, FIRMWARE_LOAD_ATTEMPTS};

// ─── Device ─────────────────────────────────────────────────────────
pub use crate::hal::config::{DeviceConfig, SimulationConfig};
pub use crate::hal::driver::{DriverFactory, FalconDriver, LinkError};
pub use crate::hal::types::{
    ButtonState, DevicePosition, DeviceSample, FirmwareImage, ForceVector, Indicator,
};

// ─── Control ────────────────────────────────────────────────────────
pub use crate::control_unit::control::{ControlConfig, ControlMode, ModeBinding, PdGains};
pub use crate::control_unit::homing::{HomingConfig, HomingStatus};

// ─── Telemetry ──────────────────────────────────────────────────────
pub use crate::telemetry::{JoystickMessage, PoseMessage, TransportConfig};
