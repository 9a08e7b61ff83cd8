//! Integration test: bring-up sequence.
//!
//! Validates: config → device open → firmware retries → homing with LED
//! feedback, and every fatal startup path.

use std::sync::atomic::AtomicBool;

use falcon_common::hal::driver::LinkError;
use falcon_common::hal::types::{FirmwareImage, Indicator};
use falcon_control_unit::config::load_config_from_str;
use falcon_control_unit::error::StartupError;
use falcon_control_unit::state::homing::run_homing;
use falcon_hal::DriverRegistry;
use falcon_hal::drivers::simulation::SimulationDriver;
use falcon_hal::firmware::FirmwareOutcome;
use falcon_hal::link::DeviceLink;

use super::open_sim;

// ── Helpers ─────────────────────────────────────────────────────────

const FAST_HOMING: &str = r#"
[homing]
timeout_s = 5.0
poll_interval_ms = 0
settle_ms = 0
"#;

fn with_sim(sim: &str) -> String {
    format!("{FAST_HOMING}\n[device.simulation]\n{sim}\n")
}

fn firmware() -> FirmwareImage {
    FirmwareImage::empty("test_firmware")
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn operator_homing_with_firmware_retries() {
    let (mut link, handle, config) = open_sim(&with_sim(
        "firmware_failures = 3\nhoming_cycles = 5\nhand_stiffness = 5000.0",
    ));
    let running = AtomicBool::new(true);

    let report = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap();

    assert_eq!(report.firmware, FirmwareOutcome::Loaded { attempts: 4 });
    assert!(report.operator_homed);
    assert_eq!(report.failed_cycles, 0);
    assert_eq!(handle.load_attempts(), 4);
    assert!(handle.homing_mode());
    assert!(link.is_homed());
    assert_eq!(handle.led_history(), vec![Indicator::Red, Indicator::Blue]);
    assert_eq!(handle.led(), Indicator::Blue);
}

#[test]
fn homing_writes_zero_force_first() {
    let (mut link, handle, config) = open_sim(&with_sim("homing_cycles = 2"));
    let running = AtomicBool::new(true);
    run_homing(&mut link, &firmware(), &config.homing, &running).unwrap();

    let forces = handle.applied_forces();
    assert!(!forces.is_empty());
    assert!(forces.iter().all(|f| f.as_array() == [0.0; 3]));
}

#[test]
fn already_homed_device_skips_operator_step() {
    let (mut link, handle, config) =
        open_sim(&with_sim("homed_at_start = true\nfirmware_resident = true"));
    let running = AtomicBool::new(true);

    let report = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap();

    assert_eq!(report.firmware, FirmwareOutcome::AlreadyResident);
    assert!(!report.operator_homed);
    assert_eq!(report.polls, 1);
    assert_eq!(handle.led_history(), vec![Indicator::Blue]);
}

#[test]
fn transient_faults_during_homing_are_skipped() {
    let (mut link, _handle, config) =
        open_sim(&with_sim("homing_cycles = 6\nio_fault_every = 2"));
    let running = AtomicBool::new(true);

    let report = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap();

    assert!(report.failed_cycles > 0);
    assert!(link.is_homed());
}

#[test]
fn firmware_exhaustion_is_fatal_before_any_io() {
    let (mut link, handle, config) = open_sim(&with_sim("firmware_failures = 1000"));
    let running = AtomicBool::new(true);

    let err = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap_err();

    assert_eq!(
        err,
        StartupError::Link(LinkError::FirmwareLoadFailed { attempts: 20 })
    );
    assert_eq!(handle.load_attempts(), 20);
    assert_eq!(handle.exchanges(), 0);
    assert!(handle.led_history().is_empty());
}

#[test]
fn homing_times_out() {
    let toml = r#"
[homing]
timeout_s = 0.05
poll_interval_ms = 1
settle_ms = 0

[device.simulation]
homing_cycles = 4000000000
"#;
    let (mut link, handle, config) = open_sim(toml);
    let running = AtomicBool::new(true);

    let err = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap_err();

    match err {
        StartupError::HomingTimeout { elapsed } => assert!(elapsed.as_secs_f64() >= 0.05),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(!link.is_homed());
    assert_eq!(handle.led(), Indicator::Off);
}

#[test]
fn homing_cancelled_by_running_flag() {
    let (mut link, _handle, config) = open_sim(&with_sim("homing_cycles = 100"));
    let running = AtomicBool::new(false);

    let err = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap_err();
    assert_eq!(err, StartupError::Cancelled);
}

#[test]
fn closed_link_aborts_homing() {
    let (mut link, _handle, config) = open_sim(&with_sim("firmware_resident = true"));
    link.close();
    let running = AtomicBool::new(true);

    let err = run_homing(&mut link, &firmware(), &config.homing, &running).unwrap_err();
    assert_eq!(err, StartupError::Link(LinkError::NotOpen));
}

#[test]
fn missing_device_index_fails_open() {
    let config = load_config_from_str("[device]\nindex = 2\n").unwrap();
    let registry = DriverRegistry::with_builtin();
    let driver = registry.create_driver(&config.device.driver).unwrap();

    let result = DeviceLink::open(driver, &config.device);
    assert!(matches!(
        result,
        Err(LinkError::DeviceNotFound { index: 2 })
    ));
}

#[test]
fn second_device_on_bus_opens() {
    let config =
        load_config_from_str("[device]\nindex = 1\n\n[device.simulation]\ndevice_count = 2\n")
            .unwrap();
    let (driver, handle) = SimulationDriver::with_handle();
    let link = DeviceLink::open(Box::new(driver), &config.device).unwrap();
    assert_eq!(link.device_index(), 1);
    assert!(handle.is_open());
}

#[test]
fn unknown_driver_rejected() {
    let registry = DriverRegistry::with_builtin();
    assert!(matches!(
        registry.create_driver("libnifalcon"),
        Err(LinkError::DriverNotFound(_))
    ));
}
