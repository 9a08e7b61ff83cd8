//! State machine module root.

pub mod homing;
