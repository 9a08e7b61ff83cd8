//! Homing state machine and the blocking homing procedure.
//!
//! ## Lifecycle
//!
//! 1. Make firmware resident (fatal on failure)
//! 2. Enable homing mode, write zero force, run one I/O cycle, settle
//! 3. Poll one I/O cycle per iteration and feed the homed flag to
//!    [`HomingStateMachine::observe`]
//! 4. `NotHomed → Homing`: red LED, operator instruction
//! 5. `Homing → Homed`: blue LED, one final I/O cycle, return
//!
//! The wait is bounded by `homing.timeout_s` and aborts when the shared
//! running flag is cleared.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use falcon_common::control_unit::homing::{HomingConfig, HomingStatus};
use falcon_common::hal::types::{FirmwareImage, ForceVector, Indicator};
use falcon_hal::firmware::FirmwareOutcome;
use falcon_hal::link::DeviceLink;
use tracing::{debug, info, warn};

use crate::error::StartupError;

// ─── State Machine ──────────────────────────────────────────────────

/// Transition produced by one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingTransition {
    /// Status did not change.
    Unchanged,
    /// `NotHomed → Homing`: operator action required.
    BeganHoming,
    /// Reached `Homed`.
    Completed,
}

/// Encoder homing status tracker. `Homed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HomingStateMachine {
    status: HomingStatus,
}

impl HomingStateMachine {
    pub const fn new() -> Self {
        Self {
            status: HomingStatus::NotHomed,
        }
    }

    pub const fn status(&self) -> HomingStatus {
        self.status
    }

    pub const fn is_homed(&self) -> bool {
        matches!(self.status, HomingStatus::Homed)
    }

    /// Feed the device's homed flag from one successful I/O cycle.
    ///
    /// A device that is already homed when first observed goes straight
    /// from `NotHomed` to `Homed`.
    pub fn observe(&mut self, device_homed: bool) -> HomingTransition {
        match (self.status, device_homed) {
            (HomingStatus::NotHomed, false) => {
                self.status = HomingStatus::Homing;
                HomingTransition::BeganHoming
            }
            (HomingStatus::NotHomed | HomingStatus::Homing, true) => {
                self.status = HomingStatus::Homed;
                HomingTransition::Completed
            }
            (HomingStatus::Homing, false) | (HomingStatus::Homed, _) => HomingTransition::Unchanged,
        }
    }
}

// ─── Homing Procedure ───────────────────────────────────────────────

/// Summary of a completed homing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingReport {
    /// How firmware was made resident.
    pub firmware: FirmwareOutcome,
    /// Poll iterations, failed ones included.
    pub polls: u64,
    /// Poll iterations whose I/O cycle failed.
    pub failed_cycles: u64,
    /// Time from the first poll until homed.
    pub elapsed: Duration,
    /// Whether the operator had to home the device.
    pub operator_homed: bool,
}

/// Bring the device from open to homed.
///
/// # Errors
/// - `StartupError::Link` if firmware cannot be loaded or the link fails
///   with a non-transient error
/// - `StartupError::HomingTimeout` when `config.timeout_s` elapses
/// - `StartupError::Cancelled` when `running` is cleared
pub fn run_homing(
    link: &mut DeviceLink,
    firmware: &FirmwareImage,
    config: &HomingConfig,
    running: &AtomicBool,
) -> Result<HomingReport, StartupError> {
    let firmware = link.ensure_firmware(firmware)?;

    link.set_homing_mode(true);
    link.write_force(ForceVector::ZERO);
    if let Err(e) = link.run_io_cycle() {
        debug!("Initial I/O cycle failed: {}", e);
    }
    thread::sleep(config.settle());

    let timeout = config.timeout();
    let poll_interval = config.poll_interval();
    let start = Instant::now();
    let mut machine = HomingStateMachine::new();
    let mut polls = 0u64;
    let mut failed_cycles = 0u64;
    let mut operator_homed = false;

    loop {
        if !running.load(Ordering::SeqCst) {
            info!("Homing cancelled");
            return Err(StartupError::Cancelled);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            warn!("Homing not completed after {:?}", elapsed);
            link.set_indicator(Indicator::Off);
            return Err(StartupError::HomingTimeout { elapsed });
        }

        polls += 1;
        match link.run_io_cycle() {
            Err(e) if e.is_transient() => {
                failed_cycles += 1;
                debug!("Homing poll {} skipped: {}", polls, e);
            }
            Err(e) => return Err(e.into()),
            Ok(()) => match machine.observe(link.is_homed()) {
                HomingTransition::BeganHoming => {
                    operator_homed = true;
                    link.set_indicator(Indicator::Red);
                    info!(
                        "Falcon not homed: move the grip all the way out, then push it straight in"
                    );
                }
                HomingTransition::Completed => {
                    link.set_indicator(Indicator::Blue);
                    info!("Falcon homed after {} polls", polls);
                    break;
                }
                HomingTransition::Unchanged => {}
            },
        }

        thread::sleep(poll_interval);
    }

    let elapsed = start.elapsed();
    if let Err(e) = link.run_io_cycle() {
        debug!("Post-homing I/O cycle failed: {}", e);
    }

    Ok(HomingReport {
        firmware,
        polls,
        failed_cycles,
        elapsed,
        operator_homed,
    })
}
