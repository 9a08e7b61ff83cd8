//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `FalconDriver` trait with a
//! software Falcon: firmware upload, encoder homing, a compliant grip and
//! scripted transfer faults.

use super::state::{SimHandle, SimState};
use falcon_common::hal::config::{DeviceConfig, SimulationConfig};
use falcon_common::hal::driver::{FalconDriver, LinkError};
use falcon_common::hal::types::{DeviceSample, FirmwareImage, ForceVector, Indicator};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Simulation driver implementing the FalconDriver trait.
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    /// Device state, shared with handles
    state: Arc<Mutex<SimState>>,
}

impl SimulationDriver {
    /// Create a simulation driver with default settings.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            state: Arc::new(Mutex::new(SimState::new(&SimulationConfig::default()))),
        }
    }

    /// Create a driver plus a handle observing the same device.
    ///
    /// `init()` resets the device from configuration, so adjust it through
    /// the handle after the link is open.
    pub fn with_handle() -> (Self, SimHandle) {
        let driver = Self::new();
        let handle = SimHandle::new(Arc::clone(&driver.state));
        (driver, handle)
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FalconDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &DeviceConfig) -> Result<(), LinkError> {
        let sim = &config.simulation;
        info!(
            "Initializing simulation driver: {} device(s), firmware resident={}, homed={}",
            sim.device_count, sim.firmware_resident, sim.homed_at_start
        );
        *self.lock() = SimState::new(sim);
        Ok(())
    }

    fn device_count(&self) -> u32 {
        self.lock().device_count()
    }

    fn open(&mut self, index: u32) -> Result<(), LinkError> {
        self.lock().open(index)?;
        debug!("Simulated Falcon {} opened", index);
        Ok(())
    }

    fn is_firmware_loaded(&mut self) -> bool {
        self.lock().is_firmware_loaded()
    }

    fn load_firmware(
        &mut self,
        image: &FirmwareImage,
        skip_checksum: bool,
    ) -> Result<(), LinkError> {
        debug!(
            firmware = image.name(),
            bytes = image.len(),
            skip_checksum,
            "Uploading firmware to simulated device"
        );
        self.lock().load_firmware()
    }

    fn set_homing_mode(&mut self, enabled: bool) {
        self.lock().set_homing_mode(enabled);
    }

    fn exchange(&mut self, force: ForceVector) -> Result<DeviceSample, LinkError> {
        self.lock().exchange(force)
    }

    fn set_led(&mut self, indicator: Indicator) -> Result<(), LinkError> {
        self.lock().set_led(indicator)
    }

    fn close(&mut self) {
        info!("Shutting down simulation driver");
        self.lock().close();
    }
}
