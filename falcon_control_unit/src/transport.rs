//! Transport seams between the control loop and the outside world.
//!
//! - [`publisher`] - Outbound joystick telemetry
//! - [`pose`] - Inbound pose messages (diagnostic only)

pub mod pose;
pub mod publisher;

use thiserror::Error;

/// Transport failure. Never fatal to the control loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Underlying writer failed.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// Message could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}
