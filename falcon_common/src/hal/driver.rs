//! Falcon driver trait and error types.
//!
//! This module defines:
//! - `FalconDriver` trait - Interface for pluggable device backends
//! - `LinkError` enum - Error types for device operations
//! - `DriverFactory` type alias - Factory function type

use crate::hal::config::DeviceConfig;
use crate::hal::types::{DeviceSample, FirmwareImage, ForceVector, Indicator};
use thiserror::Error;

/// Error types for device operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    /// No device responded at the requested index.
    #[error("No Falcon found at device index {index}")]
    DeviceNotFound {
        /// Requested device index.
        index: u32,
    },

    /// Firmware could not be made resident.
    #[error("Firmware load failed after {attempts} attempt(s)")]
    FirmwareLoadFailed {
        /// Load attempts made.
        attempts: u32,
    },

    /// Firmware image could not be read.
    #[error("Firmware image error: {0}")]
    FirmwareRead(String),

    /// Per-cycle I/O exchange failed. Recoverable: retry next tick.
    #[error("Device I/O error: {0}")]
    Io(String),

    /// Status LED could not be set. Never fatal.
    #[error("Indicator error: {0}")]
    Indicator(String),

    /// Driver backend not registered.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Operation on a link that is not open (or already closed).
    #[error("Device link is not open")]
    NotOpen,
}

impl LinkError {
    /// True for errors the control loop retries on the next tick.
    #[inline]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn FalconDriver>;

/// Trait defining the interface for Falcon device backends.
///
/// The device link owns exactly one driver and is the only caller of
/// these methods.
///
/// # Lifecycle
///
/// 1. `init()` - Apply backend configuration
/// 2. `open()` - Bind to the Nth physical device
/// 3. firmware / homing calls, then `exchange()` once per cycle
/// 4. `close()` - Release the device
///
/// # Timing Contracts
///
/// | Operation | Max Duration | RT Constraint |
/// |-----------|--------------|---------------|
/// | `open()` | seconds | None (startup) |
/// | `load_firmware()` | seconds | None (startup) |
/// | `exchange()` | ~1 ms | **bounded**, must not block indefinitely |
/// | `close()` | 1 second | None |
pub trait FalconDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Apply device configuration before the device is opened.
    ///
    /// Default implementation does nothing.
    fn init(&mut self, _config: &DeviceConfig) -> Result<(), LinkError> {
        Ok(())
    }

    /// Number of devices currently visible to this backend.
    fn device_count(&self) -> u32;

    /// Bind to the device at `index`.
    ///
    /// # Errors
    /// `LinkError::DeviceNotFound` if no device responds at that index.
    fn open(&mut self, index: u32) -> Result<(), LinkError>;

    /// True if firmware is already resident on the device.
    fn is_firmware_loaded(&mut self) -> bool;

    /// Make one attempt at uploading `image`.
    fn load_firmware(&mut self, image: &FirmwareImage, skip_checksum: bool)
    -> Result<(), LinkError>;

    /// Enable or disable encoder homing in the firmware.
    fn set_homing_mode(&mut self, enabled: bool);

    /// One bounded read/write exchange: transmit `force`, receive a sample.
    fn exchange(&mut self, force: ForceVector) -> Result<DeviceSample, LinkError>;

    /// Set the grip LED.
    fn set_led(&mut self, indicator: Indicator) -> Result<(), LinkError>;

    /// Release the device.
    fn close(&mut self);
}
