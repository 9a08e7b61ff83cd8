//! # Falcon Joystick
//!
//! Opens a Novint Falcon, walks the operator through homing, then runs the
//! force-feedback joystick loop until SIGINT/SIGTERM.
//!
//! Joystick telemetry is written to stdout as JSON lines; logs go to
//! stderr. With `--pose-stdin`, pose messages are read from stdin as JSON
//! lines (`{"x":…,"y":…,"theta":…}`).

use clap::Parser;
use falcon_common::config::{ConfigError, LogLevel};
use falcon_common::hal::types::FirmwareImage;
use falcon_control_unit::config::{FalconConfig, load_config};
use falcon_control_unit::cycle::CycleRunner;
use falcon_control_unit::state::homing::run_homing;
use falcon_control_unit::transport::pose::{PoseInbox, spawn_line_reader};
use falcon_control_unit::transport::publisher::JsonLinesPublisher;
use falcon_hal::{DeviceLink, DriverRegistry};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Falcon Joystick: haptic joystick driver for the Novint Falcon
#[derive(Parser, Debug)]
#[command(name = "falcon_joystick")]
#[command(version)]
#[command(about = "Force-feedback joystick loop for the Novint Falcon")]
struct Args {
    /// Path to the TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Index of the Falcon to open (overrides `device.index`).
    #[arg(long)]
    device_index: Option<u32>,

    /// Driver backend (overrides `device.driver`).
    #[arg(long)]
    driver: Option<String>,

    /// Firmware image to upload (overrides `device.firmware_path`).
    #[arg(long, value_name = "FILE")]
    firmware: Option<PathBuf>,

    /// Log a control snapshot every cycle (sets `control.debug`).
    #[arg(long)]
    debug: bool,

    /// Read pose messages from stdin.
    #[arg(long)]
    pose_stdin: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_settings(&args);
    setup_tracing(
        &args,
        loaded.as_ref().map_or(LogLevel::Info, |c| c.shared.log_level),
    );

    info!("Falcon joystick v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = match loaded {
        Ok(config) => run(&args, config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Falcon joystick shutdown complete");
}

/// Load the configuration file (or defaults) and apply CLI overrides.
fn load_settings(args: &Args) -> Result<FalconConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => FalconConfig::default(),
    };

    if let Some(index) = args.device_index {
        config.device.index = index;
    }
    if let Some(driver) = &args.driver {
        config.device.driver = driver.clone();
    }
    if let Some(firmware) = &args.firmware {
        config.device.firmware_path = Some(firmware.clone());
    }
    if args.debug {
        config.control.debug = true;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: FalconConfig) -> Result<(), Box<dyn std::error::Error>> {
    match &args.config {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file given, using built-in defaults"),
    }
    info!(
        "Config OK: device={}, driver={}, rate={} Hz, debug={}",
        config.device.index, config.device.driver, config.control.rate_hz, config.control.debug
    );

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let registry = DriverRegistry::with_builtin();
    let driver = registry.create_driver(&config.device.driver)?;
    let firmware = match &config.device.firmware_path {
        Some(path) => FirmwareImage::from_file(path)?,
        None => FirmwareImage::empty(driver.name()),
    };

    let mut link = DeviceLink::open(driver, &config.device)?;
    let report = run_homing(&mut link, &firmware, &config.homing, &running)?;
    info!(
        "Homing complete: firmware {:?}, {} polls ({} failed) in {:?}",
        report.firmware, report.polls, report.failed_cycles, report.elapsed
    );

    let poses = if args.pose_stdin {
        let (tx, inbox) = PoseInbox::channel(config.transport.clone());
        spawn_line_reader(BufReader::new(io::stdin()), tx);
        info!("Reading {} from stdin", config.transport.pose_topic);
        Some(inbox)
    } else {
        None
    };

    let publisher = JsonLinesPublisher::new(io::stdout());
    let mut runner = CycleRunner::new(link, &config, publisher, poses)?;
    let stats = runner.run(&running);
    info!(
        "Ran {} cycles ({} skipped, {} publish failures, {} overruns)",
        stats.cycle_count, stats.skipped, stats.publish_failures, stats.overruns
    );

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.as_directive().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}
