//! Control Unit shared types.
//!
//! - [`control`] - Control modes, mode bindings, PD gains, `[control]` section
//! - [`homing`] - Homing status and `[homing]` section

pub mod control;
pub mod homing;
