//! Telemetry message types.
//!
//! - `JoystickMessage` - outbound grip state (buttons + three axes)
//! - `PoseMessage` - inbound pose of the driven robot, diagnostic only
//! - `TransportConfig` - `[transport]` section: topics and wall bounds

use crate::config::ConfigError;
use crate::consts::{DEFAULT_JOYSTICK_TOPIC, DEFAULT_POSE_TOPIC};
use crate::hal::types::{ButtonState, DevicePosition};
use serde::{Deserialize, Serialize};

/// One joystick sample, published every control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoystickMessage {
    /// Raw button bitmask.
    pub buttons: u32,
    /// Grip position `[x, y, z]`.
    pub axes: [f64; 3],
}

impl JoystickMessage {
    pub fn new(buttons: ButtonState, position: DevicePosition) -> Self {
        Self {
            buttons: buttons.raw(),
            axes: position.as_array(),
        }
    }
}

/// Planar pose of the robot being driven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMessage {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub theta: f32,
}

fn default_joystick_topic() -> String {
    DEFAULT_JOYSTICK_TOPIC.to_string()
}
fn default_pose_topic() -> String {
    DEFAULT_POSE_TOPIC.to_string()
}
fn default_wall_max() -> f32 {
    11.0
}

/// `[transport]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Topic the joystick messages are published on.
    #[serde(default = "default_joystick_topic")]
    pub joystick_topic: String,

    /// Topic the pose messages arrive on.
    #[serde(default = "default_pose_topic")]
    pub pose_topic: String,

    /// Lower wall coordinate of the pose arena.
    #[serde(default)]
    pub wall_min: f32,

    /// Upper wall coordinate of the pose arena.
    #[serde(default = "default_wall_max")]
    pub wall_max: f32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            joystick_topic: default_joystick_topic(),
            pose_topic: default_pose_topic(),
            wall_min: 0.0,
            wall_max: default_wall_max(),
        }
    }
}

impl TransportConfig {
    /// True if either coordinate sits exactly on a wall.
    pub fn hits_wall(&self, pose: &PoseMessage) -> bool {
        [pose.x, pose.y]
            .iter()
            .any(|c| *c == self.wall_min || *c == self.wall_max)
    }

    /// Validate the transport section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.joystick_topic.is_empty() || self.pose_topic.is_empty() {
            return Err(ConfigError::ValidationError(
                "transport topics cannot be empty".to_string(),
            ));
        }
        if !(self.wall_min < self.wall_max) {
            return Err(ConfigError::ValidationError(format!(
                "transport.wall_min ({}) must be below wall_max ({})",
                self.wall_min, self.wall_max
            )));
        }
        Ok(())
    }
}
