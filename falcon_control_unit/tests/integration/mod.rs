mod control_loop;
mod startup;

use falcon_control_unit::config::{FalconConfig, load_config_from_str};
use falcon_control_unit::cycle::{CycleRunner, TickOutcome, TickReport};
use falcon_control_unit::transport::publisher::RecordingPublisher;
use falcon_hal::drivers::simulation::{SimHandle, SimulationDriver};
use falcon_hal::link::DeviceLink;

/// Open a simulated Falcon described by `toml`.
pub fn open_sim(toml: &str) -> (DeviceLink, SimHandle, FalconConfig) {
    open_config(load_config_from_str(toml).unwrap())
}

/// Open a simulated Falcon whose grip follows the hand exactly.
pub fn open_rigid(toml: &str) -> (DeviceLink, SimHandle, FalconConfig) {
    let mut config = load_config_from_str(toml).unwrap();
    config.device.simulation.hand_stiffness = None;
    config.device.simulation.homed_at_start = true;
    open_config(config)
}

fn open_config(config: FalconConfig) -> (DeviceLink, SimHandle, FalconConfig) {
    let (driver, handle) = SimulationDriver::with_handle();
    let link = DeviceLink::open(Box::new(driver), &config.device).unwrap();
    (link, handle, config)
}

/// Simulated Falcon wrapped in a runner.
pub fn sim_runner(toml: &str) -> (CycleRunner<RecordingPublisher>, SimHandle) {
    into_runner(open_sim(toml))
}

/// Rigid-hand, already-homed Falcon wrapped in a runner.
pub fn rigid_runner(toml: &str) -> (CycleRunner<RecordingPublisher>, SimHandle) {
    into_runner(open_rigid(toml))
}

fn into_runner(
    (link, handle, config): (DeviceLink, SimHandle, FalconConfig),
) -> (CycleRunner<RecordingPublisher>, SimHandle) {
    let runner = CycleRunner::new(link, &config, RecordingPublisher::new(), None).unwrap();
    (runner, handle)
}

pub fn completed(outcome: TickOutcome) -> TickReport {
    match outcome {
        TickOutcome::Completed(report) => report,
        TickOutcome::Skipped(e) => panic!("tick skipped: {e}"),
    }
}
