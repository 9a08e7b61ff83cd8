//! Fixed-rate control loop: read → publish → control → write.
//!
//! ## Cycle Body
//! 1. Drain pending pose messages (non-blocking)
//! 2. `run_io_cycle()`; a failed exchange skips the rest of the tick and
//!    leaves the control state untouched
//! 3. Read position and buttons, publish a `JoystickMessage`
//! 4. Map buttons to a mode, run `compute_force`, buffer the force
//! 5. Keep the position as `previous` for the next tick
//!
//! ## Pacing
//! Absolute deadlines advance by one period per tick; an overrun resets the
//! deadline to now instead of trying to catch up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use falcon_common::config::ConfigError;
use falcon_common::control_unit::control::ControlMode;
use falcon_common::hal::driver::LinkError;
use falcon_common::hal::types::{DevicePosition, DeviceSample, ForceVector};
use falcon_common::telemetry::JoystickMessage;
use falcon_hal::link::DeviceLink;
use tracing::{debug, error, info, warn};

use crate::config::FalconConfig;
use crate::control::force::{ForceInput, ForceParams, compute_force};
use crate::control::mode::{HoldLatch, ModeEdge, ModeMap};
use crate::transport::pose::PoseInbox;
use crate::transport::publisher::TelemetryPublisher;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-cycle timing and outcome counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Ticks executed, skipped ones included.
    pub cycle_count: u64,
    /// Ticks skipped after a failed I/O cycle.
    pub skipped: u64,
    /// Telemetry publishes that failed.
    pub publish_failures: u64,
    /// Ticks that ran past their deadline.
    pub overruns: u64,
    /// Minimum tick duration [ns].
    pub min_cycle_ns: u64,
    /// Maximum tick duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            skipped: 0,
            publish_failures: 0,
            overruns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
        }
    }

    /// Record one tick duration.
    #[inline]
    pub fn record(&mut self, duration: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.cycle_count += 1;
        self.min_cycle_ns = self.min_cycle_ns.min(ns);
        self.max_cycle_ns = self.max_cycle_ns.max(ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(ns);
    }

    /// Average tick duration [ns] (0 if no ticks).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Control State ──────────────────────────────────────────────────

/// State carried from one successful tick to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    /// Spring rest point.
    pub reference: DevicePosition,
    /// Position from the last successful tick; `None` before the first.
    pub previous: Option<DevicePosition>,
    /// Hold latches.
    pub latch: HoldLatch,
    /// Mode of the last successful tick.
    pub mode: ControlMode,
}

impl ControlState {
    pub fn new(latch: HoldLatch) -> Self {
        Self {
            reference: DevicePosition::ZERO,
            previous: None,
            latch,
            mode: ControlMode::Free,
        }
    }
}

/// What a completed tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub sample: DeviceSample,
    pub message: JoystickMessage,
    pub mode: ControlMode,
    /// Force buffered for the next I/O cycle.
    pub force: ForceVector,
    pub reference: DevicePosition,
    pub edge: ModeEdge,
    /// Pose messages handled this tick.
    pub poses: usize,
}

/// Result of [`CycleRunner::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// I/O failed; nothing published, state unchanged.
    Skipped(LinkError),
    Completed(TickReport),
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the device link and drives the control loop.
pub struct CycleRunner<P: TelemetryPublisher> {
    link: DeviceLink,
    publisher: P,
    poses: Option<PoseInbox>,
    modes: ModeMap,
    params: ForceParams,
    state: ControlState,
    topic: String,
    debug: bool,
    period: Duration,
    stats: CycleStats,
}

impl<P: TelemetryPublisher> CycleRunner<P> {
    /// Build a runner over a homed link.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` if the mode table does not fit or the
    /// rate has no representable period.
    pub fn new(
        link: DeviceLink,
        config: &FalconConfig,
        publisher: P,
        poses: Option<PoseInbox>,
    ) -> Result<Self, ConfigError> {
        let control = &config.control;
        let period = Duration::try_from_secs_f64(1.0 / control.rate_hz).map_err(|_| {
            ConfigError::ValidationError(format!(
                "control.rate_hz = {} gives no usable loop period",
                control.rate_hz
            ))
        })?;
        Ok(Self {
            link,
            publisher,
            poses,
            modes: ModeMap::from_config(control)?,
            params: ForceParams::from_config(control),
            state: ControlState::new(HoldLatch::from_config(control)),
            topic: config.transport.joystick_topic.clone(),
            debug: control.debug,
            period,
            stats: CycleStats::new(),
        })
    }

    /// Run one tick.
    pub fn tick(&mut self) -> TickOutcome {
        let poses = self.poses.as_mut().map_or(0, PoseInbox::drain);

        if let Err(e) = self.link.run_io_cycle() {
            self.stats.skipped += 1;
            return TickOutcome::Skipped(e);
        }

        let sample = self.link.sample();
        let position = sample.position;
        let message = JoystickMessage::new(sample.buttons, position);
        if let Err(e) = self.publisher.publish(&self.topic, &message) {
            self.stats.publish_failures += 1;
            warn!("Telemetry publish on {} failed: {}", self.topic, e);
        }

        let mode = self.modes.mode_for(sample.buttons);
        let input = ForceInput {
            position,
            previous: self.state.previous.unwrap_or(position),
            reference: self.state.reference,
            mode,
        };
        let out = compute_force(&input, &self.params, self.state.latch);

        match out.edge {
            ModeEdge::Pressed(held) => {
                info!("{} pressed (button {})", mode_label(held), sample.buttons.raw());
            }
            ModeEdge::Released(held) => {
                info!(
                    "{} released, reference reset to ({:.4}, {:.4}, {:.4})",
                    mode_label(held),
                    out.reference.x,
                    out.reference.y,
                    out.reference.z
                );
            }
            ModeEdge::None => {}
        }
        if out.sanitized {
            warn!("Force sanitized to {:?}", out.force);
        }

        self.link.write_force(out.force);
        self.state = ControlState {
            reference: out.reference,
            previous: Some(position),
            latch: out.latch,
            mode,
        };

        if self.debug {
            let error = position.offset_from(&out.reference);
            info!(
                position = ?position.as_array(),
                reference = ?out.reference.as_array(),
                error = ?error,
                force = ?out.force.as_array(),
                "Control snapshot"
            );
        }

        TickOutcome::Completed(TickReport {
            sample,
            message,
            mode,
            force: out.force,
            reference: out.reference,
            edge: out.edge,
            poses,
        })
    }

    /// Tick at the configured rate until `running` is cleared, then close
    /// the link.
    ///
    /// A transient I/O failure skips one tick. A non-transient link error
    /// ends the loop.
    pub fn run(&mut self, running: &AtomicBool) -> CycleStats {
        info!(
            "Starting control loop ({:.1} Hz, topic {})",
            1.0 / self.period.as_secs_f64(),
            self.topic
        );
        let mut next_wake = Instant::now();

        while running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let outcome = self.tick();
            self.stats.record(cycle_start.elapsed());

            if let TickOutcome::Skipped(e) = outcome {
                if !e.is_transient() {
                    error!("Device link lost: {}", e);
                    break;
                }
                debug!("Tick skipped: {}", e);
            }

            next_wake += self.period;
            let now = Instant::now();
            if next_wake > now {
                thread::sleep(next_wake - now);
            } else {
                self.stats.overruns += 1;
                next_wake = now;
            }
        }

        self.shutdown();
        self.stats.clone()
    }

    /// Close the device link. Further calls do nothing.
    pub fn shutdown(&mut self) {
        if self.link.is_open() {
            info!(
                "Control loop stopped after {} cycles (skipped {}, overruns {}, avg {} ns, max {} ns)",
                self.stats.cycle_count,
                self.stats.skipped,
                self.stats.overruns,
                self.stats.avg_cycle_ns(),
                self.stats.max_cycle_ns
            );
        }
        self.link.close();
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn link(&self) -> &DeviceLink {
        &self.link
    }

    pub fn poses(&self) -> Option<&PoseInbox> {
        self.poses.as_ref()
    }

    /// Loop period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

fn mode_label(mode: ControlMode) -> &'static str {
    match mode {
        ControlMode::Free => "Free",
        ControlMode::Clutched => "Clutch",
        ControlMode::Coagulated => "Coagulation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::publisher::RecordingPublisher;
    use falcon_common::hal::config::{DeviceConfig, SimulationConfig};
    use falcon_hal::drivers::simulation::{SimHandle, SimulationDriver};

    fn runner(config: FalconConfig) -> (CycleRunner<RecordingPublisher>, SimHandle) {
        let (driver, handle) = SimulationDriver::with_handle();
        let link = DeviceLink::open(Box::new(driver), &config.device).unwrap();
        let runner = CycleRunner::new(link, &config, RecordingPublisher::new(), None).unwrap();
        (runner, handle)
    }

    fn rigid_config() -> FalconConfig {
        FalconConfig {
            device: DeviceConfig {
                simulation: SimulationConfig {
                    hand_stiffness: None,
                    homed_at_start: true,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn completed(outcome: TickOutcome) -> TickReport {
        match outcome {
            TickOutcome::Completed(report) => report,
            TickOutcome::Skipped(e) => panic!("tick skipped: {e}"),
        }
    }

    #[test]
    fn cycle_stats_track_min_max_avg() {
        let mut stats = CycleStats::new();
        assert_eq!(stats.avg_cycle_ns(), 0);
        stats.record(Duration::from_nanos(100));
        stats.record(Duration::from_nanos(300));
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.min_cycle_ns, 100);
        assert_eq!(stats.max_cycle_ns, 300);
        assert_eq!(stats.avg_cycle_ns(), 200);
    }

    #[test]
    fn first_tick_has_no_derivative_kick() {
        let config = FalconConfig {
            control: falcon_common::control_unit::control::ControlConfig {
                clutch_pressed: false,
                coag_pressed: false,
                ..Default::default()
            },
            ..rigid_config()
        };
        let (mut runner, handle) = runner(config);
        handle.set_hand([0.0, 0.0, 0.1]);
        let report = completed(runner.tick());
        // Spring toward the zero reference only; previous == current.
        assert_eq!(report.force.x, 0.0);
        assert!((report.force.z - (-20.0)).abs() < 1e-9);
        assert_eq!(runner.state().previous, Some(DevicePosition::new(0.0, 0.0, 0.1)));
    }

    #[test]
    fn tick_publishes_raw_buttons_and_axes() {
        let (mut runner, handle) = runner(rigid_config());
        handle.set_hand([0.01, -0.02, 0.12]);
        handle.set_buttons(4);
        let report = completed(runner.tick());
        assert_eq!(report.message.buttons, 4);
        assert_eq!(report.message.axes, [0.01, -0.02, 0.12]);

        let (topic, message) = &runner.publisher().messages()[0];
        assert_eq!(topic, "/falcon/joystick");
        assert_eq!(*message, report.message);
    }

    #[test]
    fn skipped_tick_leaves_state_and_publishes_nothing() {
        let (mut runner, handle) = runner(rigid_config());
        completed(runner.tick());
        let before = *runner.state();

        handle.inject_io_faults(1);
        handle.set_hand([0.03, 0.0, 0.11]);
        assert!(matches!(runner.tick(), TickOutcome::Skipped(LinkError::Io(_))));
        assert_eq!(*runner.state(), before);
        assert_eq!(runner.publisher().messages().len(), 1);
        assert_eq!(runner.stats().skipped, 1);
    }

    #[test]
    fn publish_failure_does_not_stop_control() {
        let (mut runner, handle) = runner(rigid_config());
        runner.publisher_mut().fail_next(1);
        handle.set_buttons(2);
        let report = completed(runner.tick());
        assert_eq!(report.force, ForceVector::new(0.0, 0.0, 3.0));
        assert_eq!(runner.stats().publish_failures, 1);
    }

    #[test]
    fn run_stops_on_cleared_flag_and_closes_once() {
        let (mut runner, handle) = runner(rigid_config());
        let running = AtomicBool::new(false);
        let stats = runner.run(&running);
        assert_eq!(stats.cycle_count, 0);
        assert_eq!(handle.close_count(), 1);

        runner.shutdown();
        drop(runner);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn unrepresentable_period_is_a_config_error() {
        let mut config = rigid_config();
        config.control.rate_hz = 1e-300;
        let (driver, _handle) = SimulationDriver::with_handle();
        let link = DeviceLink::open(Box::new(driver), &config.device).unwrap();
        let result = CycleRunner::new(link, &config, RecordingPublisher::new(), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn debug_snapshot_leaves_tick_unchanged() {
        let (mut plain, plain_handle) = runner(rigid_config());
        let mut debug_config = rigid_config();
        debug_config.control.debug = true;
        let (mut debug, debug_handle) = runner(debug_config);

        for (hand, buttons) in [([0.0, 0.0, 0.11], 0), ([0.02, 0.01, 0.1], 0), ([0.02, 0.01, 0.1], 2)] {
            for handle in [&plain_handle, &debug_handle] {
                handle.set_hand(hand);
                handle.set_buttons(buttons);
            }
            let expected = completed(plain.tick());
            let report = completed(debug.tick());
            assert_eq!(report, expected);
        }
        assert_eq!(debug.state(), plain.state());
        assert_eq!(debug.publisher().messages(), plain.publisher().messages());
    }

    #[test]
    fn period_follows_rate() {
        let (runner, _handle) = runner(rigid_config());
        assert_eq!(runner.period(), Duration::from_millis(100));
    }
}
