//! Hardware abstraction layer types and configuration.
//!
//! This module contains the device data model, the backend driver trait
//! and the device configuration for the Falcon hardware abstraction layer.

pub mod config;
pub mod driver;
pub mod types;
