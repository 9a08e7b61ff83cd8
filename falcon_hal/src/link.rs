//! Device link: exclusive owner of one Falcon.
//!
//! The link wraps a `FalconDriver` backend and buffers the force command
//! between I/O cycles.
//!
//! # Actuation latency
//!
//! [`DeviceLink::write_force`] only buffers. The force reaches the device
//! during the next [`DeviceLink::run_io_cycle`], so a force computed from
//! the sample of cycle *n* is applied in cycle *n + 1*. Position, buttons
//! and the homed flag always come from the most recent successful cycle.

use crate::firmware::{self, FirmwareOutcome};
use falcon_common::hal::config::DeviceConfig;
use falcon_common::hal::driver::{FalconDriver, LinkError};
use falcon_common::hal::types::{
    ButtonState, DevicePosition, DeviceSample, FirmwareImage, ForceVector, Indicator,
};
use tracing::{debug, info, warn};

/// An open connection to one Falcon.
pub struct DeviceLink {
    driver: Box<dyn FalconDriver>,
    index: u32,
    firmware_attempts: u32,
    skip_checksum: bool,
    /// Force sent on the next I/O cycle
    pending_force: ForceVector,
    /// Last successful exchange
    sample: DeviceSample,
    /// Whether the last I/O cycle succeeded
    fresh: bool,
    open: bool,
    failed_cycles: u64,
}

impl DeviceLink {
    /// Initialize `driver` with `config` and bind to `config.index`.
    ///
    /// # Errors
    /// `LinkError::DeviceNotFound` if the backend has no device at that index.
    pub fn open(mut driver: Box<dyn FalconDriver>, config: &DeviceConfig) -> Result<Self, LinkError> {
        info!(
            "Opening Falcon {} via driver {} v{}",
            config.index,
            driver.name(),
            driver.version()
        );
        driver.init(config)?;
        let count = driver.device_count();
        debug!("Driver reports {} device(s)", count);
        if config.index >= count {
            return Err(LinkError::DeviceNotFound {
                index: config.index,
            });
        }
        driver.open(config.index)?;
        info!("Falcon {} opened", config.index);

        Ok(Self {
            driver,
            index: config.index,
            firmware_attempts: config.firmware_attempts,
            skip_checksum: config.skip_checksum,
            pending_force: ForceVector::ZERO,
            sample: DeviceSample::default(),
            fresh: false,
            open: true,
            failed_cycles: 0,
        })
    }

    /// Make sure firmware runs on the device.
    ///
    /// # Errors
    /// `LinkError::FirmwareLoadFailed` after the configured attempts.
    pub fn ensure_firmware(&mut self, image: &FirmwareImage) -> Result<FirmwareOutcome, LinkError> {
        self.check_open()?;
        firmware::ensure_resident(
            self.driver.as_mut(),
            image,
            self.firmware_attempts,
            self.skip_checksum,
        )
    }

    /// Enable or disable encoder homing in the firmware.
    pub fn set_homing_mode(&mut self, enabled: bool) {
        if self.open {
            debug!("Homing mode {}", if enabled { "enabled" } else { "disabled" });
            self.driver.set_homing_mode(enabled);
        }
    }

    /// Send the buffered force and receive one sample.
    ///
    /// On failure the previous sample is kept but marked stale and the
    /// buffered force stays pending for the next cycle.
    ///
    /// # Errors
    /// `LinkError::Io` for a failed transfer (transient), `LinkError::NotOpen`
    /// after `close()`.
    pub fn run_io_cycle(&mut self) -> Result<(), LinkError> {
        if let Err(e) = self.check_open() {
            self.fresh = false;
            return Err(e);
        }
        match self.driver.exchange(self.pending_force) {
            Ok(sample) => {
                self.sample = sample;
                self.fresh = true;
                Ok(())
            }
            Err(e) => {
                self.fresh = false;
                self.failed_cycles += 1;
                debug!("I/O cycle failed ({} total): {}", self.failed_cycles, e);
                Err(e)
            }
        }
    }

    /// Grip position from the last successful cycle.
    pub fn read_position(&self) -> DevicePosition {
        self.sample.position
    }

    /// Grip buttons from the last successful cycle.
    pub fn read_buttons(&self) -> ButtonState {
        self.sample.buttons
    }

    /// Encoder homed flag from the last successful cycle.
    pub fn is_homed(&self) -> bool {
        self.sample.homed
    }

    /// Whole sample from the last successful cycle.
    pub fn sample(&self) -> DeviceSample {
        self.sample
    }

    /// True if the most recent `run_io_cycle` succeeded.
    pub fn sample_is_fresh(&self) -> bool {
        self.fresh
    }

    /// Buffer `force` for the next I/O cycle. The last write wins.
    ///
    /// Non-finite components are replaced with zero.
    pub fn write_force(&mut self, force: ForceVector) {
        let (force, changed) = force.sanitized(None);
        if changed {
            warn!("Non-finite force component replaced with zero");
        }
        self.pending_force = force;
    }

    /// Force that the next I/O cycle will send.
    pub fn pending_force(&self) -> ForceVector {
        self.pending_force
    }

    /// Set the grip LED. Failures are logged and otherwise ignored.
    pub fn set_indicator(&mut self, indicator: Indicator) {
        if !self.open {
            warn!("Indicator {:?} ignored: link closed", indicator);
            return;
        }
        if let Err(e) = self.driver.set_led(indicator) {
            warn!("Failed to set indicator {:?}: {}", indicator, e);
        }
    }

    /// Zero the force and release the device. Further calls do nothing.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.pending_force = ForceVector::ZERO;
        self.driver.close();
        self.open = false;
        self.fresh = false;
        info!(
            "Falcon {} closed ({} failed I/O cycles)",
            self.index, self.failed_cycles
        );
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn device_index(&self) -> u32 {
        self.index
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// I/O cycles that failed since open.
    pub fn failed_cycles(&self) -> u64 {
        self.failed_cycles
    }

    fn check_open(&self) -> Result<(), LinkError> {
        if self.open {
            Ok(())
        } else {
            Err(LinkError::NotOpen)
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        self.close();
    }
}
