//! Falcon Common Library
//!
//! Shared data model, driver trait and configuration loading for all
//! Falcon workspace crates.
//!
//! # Module Structure
//!
//! - [`hal`] - Device data model, driver trait, device configuration
//! - [`control_unit`] - Control mode, PD gains, homing status and configuration
//! - [`telemetry`] - Outbound joystick and inbound pose messages
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use falcon_common::prelude::*;
//!
//! let p = DevicePosition::new(0.01, 0.0, 0.12);
//! assert!(p.offset_from(&DevicePosition::ZERO)[0] > 0.0);
//! ```

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod hal;
pub mod prelude;
pub mod telemetry;
