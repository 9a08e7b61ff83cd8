//! Control types for the force loop.
//!
//! Defines `ControlMode`, `ModeBinding`, `PdGains` and the `[control]`
//! configuration section.

use crate::config::ConfigError;
use crate::consts::{
    DEFAULT_LOOP_RATE_HZ, MAX_ABS_KD, MAX_ABS_KP, MAX_LOOP_RATE_HZ, MAX_MODE_BINDINGS,
    MIN_LOOP_RATE_HZ,
};
use serde::{Deserialize, Serialize};

/// Operator control mode, derived from the grip buttons every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ControlMode {
    /// PD spring-damper toward the reference position.
    #[default]
    Free = 0,
    /// Clutch held: constant hold force.
    Clutched = 1,
    /// Coagulation held: constant hold force.
    Coagulated = 2,
}

impl ControlMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Free),
            1 => Some(Self::Clutched),
            2 => Some(Self::Coagulated),
            _ => None,
        }
    }

    /// True for the modes that output the fixed hold force.
    #[inline]
    pub const fn is_hold(&self) -> bool {
        matches!(self, Self::Clutched | Self::Coagulated)
    }
}

/// One row of the button → mode table.
///
/// `buttons` is compared for exact equality with the grip bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeBinding {
    /// Raw button bitmask.
    pub buttons: u32,
    /// Mode entered while exactly these buttons are pressed.
    pub mode: ControlMode,
}

/// Proportional and derivative gains per axis.
///
/// Negative gains oppose displacement and velocity (restoring spring +
/// damper). The loop is only stable within the documented range; see
/// [`PdGains::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdGains {
    /// Proportional gain per axis.
    pub kp: [f64; 3],
    /// Derivative gain per axis (applied to the per-cycle position delta).
    pub kd: [f64; 3],
}

impl Default for PdGains {
    fn default() -> Self {
        Self {
            kp: [-200.0; 3],
            kd: [-500.0; 3],
        }
    }
}

impl PdGains {
    /// Check the stability precondition: every gain finite, `<= 0`,
    /// `|kp| <= MAX_ABS_KP` and `|kd| <= MAX_ABS_KD`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_gains("kp", &self.kp, MAX_ABS_KP)?;
        check_gains("kd", &self.kd, MAX_ABS_KD)
    }
}

fn check_gains(name: &str, gains: &[f64; 3], max_abs: f64) -> Result<(), ConfigError> {
    for (axis, g) in ["x", "y", "z"].iter().zip(gains) {
        if !g.is_finite() || *g > 0.0 || g.abs() > max_abs {
            return Err(ConfigError::ValidationError(format!(
                "control.{name}[{axis}] = {g} outside safe range [-{max_abs}, 0]"
            )));
        }
    }
    Ok(())
}

fn default_rate_hz() -> f64 {
    DEFAULT_LOOP_RATE_HZ
}
fn default_true() -> bool {
    true
}
fn default_kp() -> [f64; 3] {
    PdGains::default().kp
}
fn default_kd() -> [f64; 3] {
    PdGains::default().kd
}
fn default_hold_force() -> [f64; 3] {
    [0.0, 0.0, 3.0]
}
fn default_modes() -> Vec<ModeBinding> {
    vec![
        ModeBinding {
            buttons: 0x02,
            mode: ControlMode::Clutched,
        },
        ModeBinding {
            buttons: 0x04,
            mode: ControlMode::Coagulated,
        },
    ]
}

/// `[control]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Control loop and telemetry rate [Hz].
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,

    /// Emit a per-cycle diagnostic snapshot.
    #[serde(default)]
    pub debug: bool,

    /// Clutch considered held at startup.
    #[serde(default = "default_true")]
    pub clutch_pressed: bool,

    /// Coagulation considered held at startup.
    #[serde(default = "default_true")]
    pub coag_pressed: bool,

    /// Proportional gains `[x, y, z]`.
    #[serde(default = "default_kp")]
    pub kp: [f64; 3],

    /// Derivative gains `[x, y, z]`.
    #[serde(default = "default_kd")]
    pub kd: [f64; 3],

    /// Force output while a hold mode is active.
    #[serde(default = "default_hold_force")]
    pub hold_force: [f64; 3],

    /// Optional per-axis force clamp.
    #[serde(default)]
    pub force_limit: Option<f64>,

    /// Button → mode table. Unlisted button values select `Free`.
    #[serde(default = "default_modes")]
    pub modes: Vec<ModeBinding>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            debug: false,
            clutch_pressed: true,
            coag_pressed: true,
            kp: default_kp(),
            kd: default_kd(),
            hold_force: default_hold_force(),
            force_limit: None,
            modes: default_modes(),
        }
    }
}

impl ControlConfig {
    /// Gains as a [`PdGains`].
    pub fn gains(&self) -> PdGains {
        PdGains {
            kp: self.kp,
            kd: self.kd,
        }
    }

    /// Validate the control section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rate_hz.is_finite()
            && (MIN_LOOP_RATE_HZ..=MAX_LOOP_RATE_HZ).contains(&self.rate_hz))
        {
            return Err(ConfigError::ValidationError(format!(
                "control.rate_hz = {} outside [{MIN_LOOP_RATE_HZ}, {MAX_LOOP_RATE_HZ}]",
                self.rate_hz
            )));
        }
        self.gains().validate()?;
        if self.hold_force.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::ValidationError(
                "control.hold_force must be finite".to_string(),
            ));
        }
        if let Some(limit) = self.force_limit
            && !(limit.is_finite() && limit > 0.0)
        {
            return Err(ConfigError::ValidationError(format!(
                "control.force_limit must be positive, got {limit}"
            )));
        }
        if self.modes.len() > MAX_MODE_BINDINGS {
            return Err(ConfigError::ValidationError(format!(
                "control.modes has {} entries, at most {MAX_MODE_BINDINGS} allowed",
                self.modes.len()
            )));
        }
        for (i, binding) in self.modes.iter().enumerate() {
            if binding.mode == ControlMode::Free {
                return Err(ConfigError::ValidationError(format!(
                    "control.modes[{i}] binds buttons {} to free, which is implicit",
                    binding.buttons
                )));
            }
            if self.modes[..i].iter().any(|b| b.buttons == binding.buttons) {
                return Err(ConfigError::ValidationError(format!(
                    "control.modes binds buttons {} twice",
                    binding.buttons
                )));
            }
        }
        Ok(())
    }
}
