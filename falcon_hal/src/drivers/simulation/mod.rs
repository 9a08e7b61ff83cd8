//! Simulation driver module.
//!
//! A software Falcon for development and testing without the USB device.

mod driver;
mod state;

pub use driver::SimulationDriver;
pub use state::{FORCE_HISTORY_LEN, LED_HISTORY_LEN, SimHandle, SimState};

use falcon_common::hal::driver::FalconDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn FalconDriver> {
    Box::new(SimulationDriver::new())
}
