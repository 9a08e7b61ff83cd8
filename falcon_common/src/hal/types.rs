//! Device data model.
//!
//! This module defines the values exchanged with the device each I/O cycle:
//! - `DevicePosition` - Cartesian grip position in device units
//! - `ButtonState` - Four-button grip bitmask
//! - `ForceVector` - Force command, always finite once sanitized
//! - `DeviceSample` - Result of one I/O exchange
//! - `Indicator` - Grip LED colour
//! - `FirmwareImage` - Firmware blob uploaded at bring-up

use crate::hal::driver::LinkError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cartesian grip position in device units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DevicePosition {
    /// Left/right.
    pub x: f64,
    /// Up/down.
    pub y: f64,
    /// In/out (depth).
    pub z: f64,
}

impl DevicePosition {
    /// Origin of the device frame.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a position from its three coordinates.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a position from `[x, y, z]`.
    #[inline]
    pub const fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Coordinates as `[x, y, z]`.
    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Per-axis displacement `self - other`.
    #[inline]
    pub fn offset_from(&self, other: &Self) -> [f64; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }

    /// True if every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

bitflags! {
    /// Buttons currently pressed on the four-button grip.
    ///
    /// Bits outside the four named buttons are retained so that grips with
    /// extra inputs still report their raw value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ButtonState: u32 {
        /// Centre button.
        const CENTER  = 0x01;
        /// Plus button (clutch on the default mode table).
        const PLUS    = 0x02;
        /// Minus button (coagulation on the default mode table).
        const MINUS   = 0x04;
        /// Forward button.
        const FORWARD = 0x08;
    }
}

impl ButtonState {
    /// Build from the raw bitmask reported by the grip, keeping unknown bits.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Raw integer bitmask.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.bits()
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Force command sent to the device, one component per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceVector {
    /// Left/right, positive pushes right.
    pub x: f64,
    /// Up/down, positive pushes up.
    pub y: f64,
    /// In/out, positive pushes the grip back.
    pub z: f64,
}

impl ForceVector {
    /// No force.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a force from its three components.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a force from `[x, y, z]`.
    #[inline]
    pub const fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Components as `[x, y, z]`.
    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// True if every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Replace non-finite components with zero and clamp to `±limit`.
    ///
    /// Returns the sanitized force and whether any component was changed.
    pub fn sanitized(&self, limit: Option<f64>) -> (Self, bool) {
        let mut changed = false;
        let mut out = self.as_array();
        for c in out.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
                changed = true;
            }
            if let Some(limit) = limit {
                let clamped = c.clamp(-limit, limit);
                if clamped != *c {
                    *c = clamped;
                    changed = true;
                }
            }
        }
        (Self::from_array(out), changed)
    }
}

/// Result of one I/O exchange with the device.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSample {
    /// Grip position after kinematics.
    pub position: DevicePosition,
    /// Grip buttons.
    pub buttons: ButtonState,
    /// Encoders report a valid home.
    pub homed: bool,
}

/// Grip LED colour used as an operator status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Indicator {
    /// All LEDs off.
    #[default]
    Off = 0,
    /// Red: manual homing required.
    Red = 1,
    /// Green.
    Green = 2,
    /// Blue: homed and ready.
    Blue = 3,
}

/// Firmware blob uploaded to the device during bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    name: String,
    bytes: Vec<u8>,
}

impl FirmwareImage {
    /// Wrap an in-memory firmware image.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// An image with no payload, for backends that carry their own firmware.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Read a firmware image from disk.
    ///
    /// # Errors
    /// Returns `LinkError::FirmwareRead` if the file cannot be read or is empty.
    pub fn from_file(path: &Path) -> Result<Self, LinkError> {
        let bytes = std::fs::read(path).map_err(|e| {
            LinkError::FirmwareRead(format!("failed to read {}: {e}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(LinkError::FirmwareRead(format!(
                "{} is empty",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "firmware".to_string());
        Ok(Self::new(name, bytes))
    }

    /// Image name (file name when loaded from disk).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Image size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the image carries no payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
