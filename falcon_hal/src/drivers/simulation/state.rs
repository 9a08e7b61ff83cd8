//! Simulated device state and grip physics.
//!
//! `SimState` is shared between the driver and any number of `SimHandle`s
//! so tests (and the binary's demo mode) can steer the grip while the
//! device link owns the driver.

use falcon_common::hal::config::SimulationConfig;
use falcon_common::hal::driver::LinkError;
use falcon_common::hal::types::{ButtonState, DevicePosition, DeviceSample, ForceVector, Indicator};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Applied forces kept for inspection; older ones are dropped.
pub const FORCE_HISTORY_LEN: usize = 4096;

/// LED changes kept for inspection; older ones are dropped.
pub const LED_HISTORY_LEN: usize = 64;

fn push_bounded<T>(history: &mut VecDeque<T>, value: T, cap: usize) {
    if history.len() == cap {
        history.pop_front();
    }
    history.push_back(value);
}

/// Complete state of one simulated Falcon.
#[derive(Debug, Clone)]
pub struct SimState {
    config: SimulationConfig,
    open: bool,
    firmware_resident: bool,
    firmware_failures_left: u32,
    firmware_drops: bool,
    load_attempts: u32,
    homing_mode: bool,
    homing_progress: u32,
    homed: bool,
    hand: [f64; 3],
    orbit_phase: f64,
    buttons: u32,
    position: [f64; 3],
    exchanges: u64,
    pending_io_faults: u32,
    applied_forces: VecDeque<ForceVector>,
    forces_applied: u64,
    led: Indicator,
    led_history: VecDeque<Indicator>,
    led_fault: bool,
    close_count: u32,
}

impl SimState {
    /// Fresh device state from configuration.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.clone(),
            open: false,
            firmware_resident: config.firmware_resident,
            firmware_failures_left: config.firmware_failures,
            firmware_drops: false,
            load_attempts: 0,
            homing_mode: false,
            homing_progress: 0,
            homed: config.homed_at_start,
            hand: config.hand_position,
            orbit_phase: 0.0,
            buttons: 0,
            position: config.hand_position,
            exchanges: 0,
            pending_io_faults: 0,
            applied_forces: VecDeque::new(),
            forces_applied: 0,
            led: Indicator::Off,
            led_history: VecDeque::new(),
            led_fault: false,
            close_count: 0,
        }
    }

    pub(crate) fn device_count(&self) -> u32 {
        self.config.device_count
    }

    pub(crate) fn open(&mut self, index: u32) -> Result<(), LinkError> {
        if index >= self.config.device_count {
            return Err(LinkError::DeviceNotFound { index });
        }
        self.open = true;
        Ok(())
    }

    pub(crate) fn is_firmware_loaded(&self) -> bool {
        self.open && self.firmware_resident
    }

    pub(crate) fn load_firmware(&mut self) -> Result<(), LinkError> {
        if !self.open {
            return Err(LinkError::NotOpen);
        }
        self.load_attempts += 1;
        if self.firmware_failures_left > 0 {
            self.firmware_failures_left -= 1;
            return Err(LinkError::Io("firmware checksum mismatch".to_string()));
        }
        // A dropping device acknowledges the upload but never runs it.
        self.firmware_resident = !self.firmware_drops;
        Ok(())
    }

    pub(crate) fn set_homing_mode(&mut self, enabled: bool) {
        self.homing_mode = enabled;
    }

    /// One exchange: apply `force` and settle the grip.
    pub(crate) fn exchange(&mut self, force: ForceVector) -> Result<DeviceSample, LinkError> {
        if !self.open {
            return Err(LinkError::NotOpen);
        }
        self.exchanges += 1;
        if self.pending_io_faults > 0 {
            self.pending_io_faults -= 1;
            return Err(LinkError::Io("injected transfer failure".to_string()));
        }
        if self.config.io_fault_every > 0
            && self.exchanges % u64::from(self.config.io_fault_every) == 0
        {
            return Err(LinkError::Io(format!(
                "scheduled transfer failure at exchange {}",
                self.exchanges
            )));
        }

        push_bounded(&mut self.applied_forces, force, FORCE_HISTORY_LEN);
        self.forces_applied += 1;
        self.orbit_phase += self.config.orbit_step_rad;
        self.settle(force);

        if self.homing_mode && !self.homed {
            self.homing_progress += 1;
            if self.homing_progress >= self.config.homing_cycles {
                self.homed = true;
                debug!(exchanges = self.exchanges, "Simulated encoders homed");
            }
        }

        trace!(?force, position = ?self.position, "Simulated exchange");
        Ok(self.sample())
    }

    fn settle(&mut self, force: ForceVector) {
        let r = self.config.orbit_radius;
        let orbit = [r * self.orbit_phase.cos(), r * self.orbit_phase.sin(), 0.0];
        let f = force.as_array();
        let limit = self.config.workspace_limit;
        for axis in 0..3 {
            let compliance = self.config.hand_stiffness.map_or(0.0, |k| f[axis] / k);
            let center = self.config.hand_position[axis];
            self.position[axis] = (self.hand[axis] + orbit[axis] + compliance)
                .clamp(center - limit, center + limit);
        }
    }

    fn sample(&self) -> DeviceSample {
        DeviceSample {
            position: DevicePosition::from_array(self.position),
            buttons: ButtonState::from_raw(self.buttons),
            homed: self.homed,
        }
    }

    pub(crate) fn set_led(&mut self, indicator: Indicator) -> Result<(), LinkError> {
        if self.led_fault {
            return Err(LinkError::Indicator("LED write rejected".to_string()));
        }
        self.led = indicator;
        push_bounded(&mut self.led_history, indicator, LED_HISTORY_LEN);
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
        self.close_count += 1;
    }
}

/// Shared handle to a simulated device.
///
/// Cloning is cheap; every clone sees the same device.
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    pub(crate) fn new(state: Arc<Mutex<SimState>>) -> Self {
        Self { state }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Stimulus ───────────────────────────────────────────────────

    /// Move the operator's hand (rest position of the grip).
    pub fn set_hand(&self, hand: [f64; 3]) {
        self.lock().hand = hand;
    }

    /// Set the raw grip button bitmask.
    pub fn set_buttons(&self, buttons: u32) {
        self.lock().buttons = buttons;
    }

    /// Fail the next `count` exchanges with an I/O error.
    pub fn inject_io_faults(&self, count: u32) {
        self.lock().pending_io_faults += count;
    }

    /// Make LED writes fail.
    pub fn set_led_fault(&self, fault: bool) {
        self.lock().led_fault = fault;
    }

    /// Acknowledge firmware uploads without the firmware becoming resident.
    pub fn set_firmware_drops(&self, drops: bool) {
        self.lock().firmware_drops = drops;
    }

    /// Force the encoder homed flag.
    pub fn set_homed(&self, homed: bool) {
        self.lock().homed = homed;
    }

    // ─── Observation ────────────────────────────────────────────────

    /// Most recent forces (up to [`FORCE_HISTORY_LEN`]), oldest first.
    pub fn applied_forces(&self) -> Vec<ForceVector> {
        self.lock().applied_forces.iter().copied().collect()
    }

    /// Forces received since open, including ones dropped from the history.
    pub fn forces_applied(&self) -> u64 {
        self.lock().forces_applied
    }

    /// Most recently received force, if any.
    pub fn last_applied_force(&self) -> Option<ForceVector> {
        self.lock().applied_forces.back().copied()
    }

    /// Current grip position.
    pub fn position(&self) -> DevicePosition {
        DevicePosition::from_array(self.lock().position)
    }

    pub fn led(&self) -> Indicator {
        self.lock().led
    }

    pub fn led_history(&self) -> Vec<Indicator> {
        self.lock().led_history.iter().copied().collect()
    }

    pub fn homing_mode(&self) -> bool {
        self.lock().homing_mode
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn is_homed(&self) -> bool {
        self.lock().homed
    }

    /// Exchanges attempted, failed ones included.
    pub fn exchanges(&self) -> u64 {
        self.lock().exchanges
    }

    pub fn load_attempts(&self) -> u32 {
        self.lock().load_attempts
    }

    pub fn close_count(&self) -> u32 {
        self.lock().close_count
    }
}
