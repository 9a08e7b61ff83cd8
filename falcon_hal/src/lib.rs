//! # Falcon HAL Library
//!
//! Device link and pluggable driver backends for the Novint Falcon.
//! Backends implement the `FalconDriver` trait defined in
//! `falcon_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`link`] - `DeviceLink`, the exclusive owner of an open device
//! - [`firmware`] - Firmware bring-up with bounded retries
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        falcon_hal                            │
//! │  ┌──────────────┐    ┌──────────────┐    ┌────────────────┐  │
//! │  │  DeviceLink  │◄──►│ FalconDriver │◄───│ DriverRegistry │  │
//! │  │ (force buf)  │    │ (trait obj)  │    │                │  │
//! │  └──────────────┘    └──────────────┘    └────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod driver_registry;
pub mod drivers;
pub mod firmware;
pub mod link;

// Re-export key types for convenience
pub use crate::driver_registry::DriverRegistry;
pub use crate::firmware::FirmwareOutcome;
pub use crate::link::DeviceLink;
