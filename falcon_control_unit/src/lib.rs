//! # Falcon Control Unit Library
//!
//! Turns a Novint Falcon into a force-feedback joystick: brings the device
//! up (firmware, homing), then runs a fixed-rate loop that publishes the
//! grip state and renders a PD spring-damper around a movable reference.
//!
//! ## Startup
//!
//! 1. Load [`config::FalconConfig`]
//! 2. Open a `DeviceLink` through the driver registry
//! 3. [`state::homing::run_homing`] until the encoders are homed
//! 4. [`cycle::CycleRunner::run`] until shutdown
//!
//! ## Control Modes
//!
//! Exact grip button values select a hold mode (fixed push-back force);
//! anything else is free mode. Releasing a hold re-zeros the spring at the
//! grip's current position.

pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod state;
pub mod transport;
