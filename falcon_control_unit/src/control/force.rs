//! PD force law with hold modes.
//!
//! `compute_force` is pure: all state it needs (reference, previous
//! position, latches) comes in through its arguments and leaves through
//! [`ForceOutput`].

use falcon_common::control_unit::control::{ControlConfig, ControlMode, PdGains};
use falcon_common::hal::types::{DevicePosition, ForceVector};

use super::mode::{HoldLatch, ModeEdge};

/// Static controller parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Spring and damper gains.
    pub gains: PdGains,
    /// Output while a hold mode is active.
    pub hold_force: ForceVector,
    /// Optional per-axis clamp.
    pub force_limit: Option<f64>,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self::from_config(&ControlConfig::default())
    }
}

impl ForceParams {
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            gains: config.gains(),
            hold_force: ForceVector::from_array(config.hold_force),
            force_limit: config.force_limit,
        }
    }
}

/// Inputs for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceInput {
    /// Grip position this cycle.
    pub position: DevicePosition,
    /// Grip position last cycle.
    pub previous: DevicePosition,
    /// Spring rest point.
    pub reference: DevicePosition,
    /// Mode selected by the buttons this cycle.
    pub mode: ControlMode,
}

/// Result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceOutput {
    /// Force to write, always finite.
    pub force: ForceVector,
    /// Reference for the next cycle.
    pub reference: DevicePosition,
    /// Latches for the next cycle.
    pub latch: HoldLatch,
    /// Edge observed this cycle.
    pub edge: ModeEdge,
    /// True if the raw force was non-finite or clamped.
    pub sanitized: bool,
}

/// Compute one cycle of the force controller.
///
/// Hold modes output `params.hold_force` and set their latch. In `Free`,
/// a set latch is cleared and the reference snapped to the current
/// position (coagulation first, at most one release per cycle), then per
/// axis:
///
/// `F = Kp * (p - reference) + Kd * (p - previous)`
#[inline]
pub fn compute_force(input: &ForceInput, params: &ForceParams, latch: HoldLatch) -> ForceOutput {
    let mut latch = latch;
    let mut reference = input.reference;
    let mut edge = ModeEdge::None;

    let raw = match input.mode {
        ControlMode::Clutched | ControlMode::Coagulated => {
            if !latch.is_held(input.mode) {
                latch.set(input.mode, true);
                edge = ModeEdge::Pressed(input.mode);
            }
            params.hold_force
        }
        ControlMode::Free => {
            for held in [ControlMode::Coagulated, ControlMode::Clutched] {
                if latch.is_held(held) {
                    latch.set(held, false);
                    reference = input.position;
                    edge = ModeEdge::Released(held);
                    break;
                }
            }
            pd_force(&params.gains, input.position, input.previous, reference)
        }
    };

    let (force, sanitized) = raw.sanitized(params.force_limit);
    ForceOutput {
        force,
        reference,
        latch,
        edge,
        sanitized,
    }
}

#[inline]
fn pd_force(
    gains: &PdGains,
    position: DevicePosition,
    previous: DevicePosition,
    reference: DevicePosition,
) -> ForceVector {
    let error = position.offset_from(&reference);
    let delta = position.offset_from(&previous);
    let mut out = [0.0; 3];
    for (axis, f) in out.iter_mut().enumerate() {
        *f = gains.kp[axis] * error[axis] + gains.kd[axis] * delta[axis];
    }
    ForceVector::from_array(out)
}
