//! Falcon driver implementations.
//!
//! - [`simulation`] - Software Falcon for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `FalconDriver` trait from `falcon_common::hal::driver`
//! 3. Register its factory in [`register_builtin`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers into `registry`.
pub fn register_builtin(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);
}
