//! Force controller root.
//!
//! Maps grip buttons to a `ControlMode`, tracks the hold latches, and runs
//! the PD spring-damper toward the reference position.

pub mod force;
pub mod mode;
