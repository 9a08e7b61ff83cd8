//! Integration test: control loop against the simulated grip.
//!
//! Validates hold/release re-zeroing, actuation latency, tick skipping on
//! transfer faults, closed-loop settling and loop shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use falcon_common::control_unit::control::ControlMode;
use falcon_common::hal::driver::LinkError;
use falcon_common::hal::types::{DevicePosition, ForceVector};
use falcon_common::telemetry::PoseMessage;
use falcon_control_unit::control::mode::ModeEdge;
use falcon_control_unit::cycle::{CycleRunner, TickOutcome};
use falcon_control_unit::transport::pose::PoseInbox;
use falcon_control_unit::transport::publisher::RecordingPublisher;

use super::{completed, open_rigid, rigid_runner, sim_runner};

const HOLD: ForceVector = ForceVector::new(0.0, 0.0, 3.0);

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn release_rezeros_at_release_position() {
    let (mut runner, handle) = rigid_runner("");
    let home = DevicePosition::new(0.0, 0.0, 0.11);

    // Both latches start held: two releases, one per tick.
    let t1 = completed(runner.tick());
    assert_eq!(t1.edge, ModeEdge::Released(ControlMode::Coagulated));
    let t2 = completed(runner.tick());
    assert_eq!(t2.edge, ModeEdge::Released(ControlMode::Clutched));
    assert_eq!(t2.reference, home);
    assert_eq!(t2.force, ForceVector::ZERO);

    // Clutch, move, release.
    handle.set_buttons(2);
    let t3 = completed(runner.tick());
    assert_eq!(t3.edge, ModeEdge::Pressed(ControlMode::Clutched));
    assert_eq!(t3.force, HOLD);

    let moved = [0.02, -0.01, 0.13];
    handle.set_hand(moved);
    let t4 = completed(runner.tick());
    assert_eq!(t4.mode, ControlMode::Clutched);
    assert_eq!(t4.force, HOLD);

    handle.set_buttons(0);
    let t5 = completed(runner.tick());
    assert_eq!(t5.edge, ModeEdge::Released(ControlMode::Clutched));
    assert_eq!(t5.reference, DevicePosition::from_array(moved));
    assert_eq!(t5.force, ForceVector::ZERO);

    // Zero-force point is the release position, not the original home.
    let t6 = completed(runner.tick());
    assert_eq!(t6.force, ForceVector::ZERO);
    assert_ne!(t6.reference, home);
}

#[test]
fn hold_force_is_constant_while_coag_held() {
    let (mut runner, handle) = rigid_runner("");
    handle.set_buttons(4);
    for hand in [[0.0, 0.0, 0.11], [0.05, 0.05, 0.15], [-0.04, 0.03, 0.07]] {
        handle.set_hand(hand);
        let report = completed(runner.tick());
        assert_eq!(report.mode, ControlMode::Coagulated);
        assert_eq!(report.force, HOLD);
    }
}

#[test]
fn force_reaches_device_one_cycle_later() {
    let (mut runner, handle) = rigid_runner("");
    handle.set_buttons(2);
    completed(runner.tick());

    // Tick 1 exchanged the zero force buffered before the loop.
    assert_eq!(handle.applied_forces(), vec![ForceVector::ZERO]);
    assert_eq!(runner.link().pending_force(), HOLD);

    completed(runner.tick());
    assert_eq!(handle.last_applied_force(), Some(HOLD));
}

#[test]
fn transfer_fault_keeps_previous_position() {
    let (mut runner, handle) = rigid_runner("[control]\nclutch_pressed = false\ncoag_pressed = false\n");
    handle.set_hand([0.0, 0.0, 0.0]);
    // Clamped to the workspace floor.
    let first = completed(runner.tick());
    assert!((first.sample.position.z - 0.05).abs() < 1e-9);

    handle.inject_io_faults(1);
    handle.set_hand([0.01, 0.0, 0.0]);
    assert!(matches!(
        runner.tick(),
        TickOutcome::Skipped(LinkError::Io(_))
    ));
    assert_eq!(runner.publisher().messages().len(), 1);

    let third = completed(runner.tick());
    // Derivative against the last good sample: -200*0.01 + -500*0.01.
    assert!(approx(third.force.x, -7.0));
    assert_eq!(runner.publisher().messages().len(), 2);
}

#[test]
fn compliant_grip_settles_against_spring() {
    let (mut runner, handle) = sim_runner("[device.simulation]\nhomed_at_start = true\n");

    // Release both latches at the rest position.
    completed(runner.tick());
    completed(runner.tick());
    let reference = runner.state().reference;
    assert_eq!(reference, DevicePosition::new(0.0, 0.0, 0.11));

    // Operator pushes 1 cm right; grip yields to the spring.
    handle.set_hand([0.01, 0.0, 0.11]);
    let mut last = None;
    for _ in 0..40 {
        last = Some(completed(runner.tick()));
    }
    let last = last.unwrap();

    // Equilibrium: p = h + Kp * p / k  →  p = 0.01 / (1 + 200/5000).
    let expected = 0.01 / 1.04;
    assert!((last.sample.position.x - expected).abs() < 1e-6);
    assert!((last.force.x - (-200.0 * expected)).abs() < 1e-3);
    assert!(last.force.is_finite());
}

#[test]
fn poses_drained_once_per_tick() {
    let (link, _handle, config) = open_rigid("");
    let (tx, inbox) = PoseInbox::channel(config.transport.clone());
    let mut runner =
        CycleRunner::new(link, &config, RecordingPublisher::new(), Some(inbox)).unwrap();

    tx.send(PoseMessage { x: 5.0, y: 5.0, theta: 0.0 }).unwrap();
    tx.send(PoseMessage { x: 11.0, y: 2.0, theta: 1.0 }).unwrap();
    assert_eq!(completed(runner.tick()).poses, 2);
    assert_eq!(completed(runner.tick()).poses, 0);

    let inbox = runner.poses().unwrap();
    assert_eq!(inbox.received(), 2);
    assert_eq!(inbox.wall_hits(), 1);
}

#[test]
fn run_until_stopped_then_close_once() {
    let (mut runner, handle) = rigid_runner("[control]\nrate_hz = 200.0\n");
    let running = Arc::new(AtomicBool::new(true));
    let stopper = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            running.store(false, Ordering::SeqCst);
        })
    };

    let stats = runner.run(&running);
    stopper.join().unwrap();

    assert!(stats.cycle_count > 0);
    assert_eq!(
        runner.publisher().messages().len() as u64,
        stats.cycle_count - stats.skipped
    );
    assert_eq!(handle.close_count(), 1);
    assert!(!runner.link().is_open());

    drop(runner);
    assert_eq!(handle.close_count(), 1);
}

#[test]
fn run_survives_scheduled_faults() {
    let (mut runner, handle) = rigid_runner("[control]\nrate_hz = 500.0\n");
    let running = Arc::new(AtomicBool::new(true));
    let stopper = {
        let running = Arc::clone(&running);
        let handle = handle.clone();
        thread::spawn(move || {
            for _ in 0..5 {
                handle.inject_io_faults(1);
                thread::sleep(Duration::from_millis(10));
            }
            running.store(false, Ordering::SeqCst);
        })
    };

    let stats = runner.run(&running);
    stopper.join().unwrap();

    assert!(stats.skipped >= 1);
    assert!(stats.cycle_count > stats.skipped);
    assert_eq!(handle.close_count(), 1);
}
