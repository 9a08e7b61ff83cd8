//! System-wide constants for the Falcon workspace.
//!
//! Single source of truth for numeric limits, default topics and paths.

use static_assertions::const_assert;

/// Device index opened when none is configured (first Falcon on the bus).
pub const DEFAULT_DEVICE_INDEX: u32 = 0;

/// Firmware load attempts before giving up.
pub const FIRMWARE_LOAD_ATTEMPTS: u32 = 20;

/// Default control loop / telemetry rate [Hz].
pub const DEFAULT_LOOP_RATE_HZ: f64 = 10.0;

/// Lower bound on the control loop rate [Hz].
pub const MIN_LOOP_RATE_HZ: f64 = 0.1;

/// Upper bound on the control loop rate [Hz]. The device's internal force
/// loop runs at about 1 kHz; the outer loop may not exceed it.
pub const MAX_LOOP_RATE_HZ: f64 = 1000.0;

/// Longest accepted homing wait [s].
pub const MAX_HOMING_TIMEOUT_S: f64 = 3600.0;

/// Maximum number of button-to-mode bindings in a mode table.
pub const MAX_MODE_BINDINGS: usize = 8;

/// Largest accepted proportional gain magnitude.
pub const MAX_ABS_KP: f64 = 1000.0;

/// Largest accepted derivative gain magnitude.
pub const MAX_ABS_KD: f64 = 2000.0;

/// Default outbound joystick topic.
pub const DEFAULT_JOYSTICK_TOPIC: &str = "/falcon/joystick";

/// Default inbound pose topic.
pub const DEFAULT_POSE_TOPIC: &str = "/turtle1/pose";

/// Default service name used in logs.
pub const DEFAULT_SERVICE_NAME: &str = "falcon_joystick";

// Clutch and coagulation both need a slot.
const_assert!(MAX_MODE_BINDINGS >= 2);
const_assert!(FIRMWARE_LOAD_ATTEMPTS > 0);
const_assert!(MIN_LOOP_RATE_HZ > 0.0);
const_assert!(MIN_LOOP_RATE_HZ <= DEFAULT_LOOP_RATE_HZ);
const_assert!(MAX_HOMING_TIMEOUT_S >= 120.0);
