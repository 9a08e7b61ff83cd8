//! Button-to-mode mapping and hold edge detection.

use falcon_common::config::ConfigError;
use falcon_common::consts::MAX_MODE_BINDINGS;
use falcon_common::control_unit::control::{ControlConfig, ControlMode, ModeBinding};
use falcon_common::hal::types::ButtonState;
use heapless::Vec;

// ─── Mode Map ───────────────────────────────────────────────────────

/// Table from exact button values to control modes.
///
/// Lookup compares the whole bitmask: with the default table, pressing
/// PLUS and MINUS together (value 6) is `Free`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeMap {
    bindings: Vec<ModeBinding, MAX_MODE_BINDINGS>,
}

impl ModeMap {
    /// Build from a binding list.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` if the list exceeds the table capacity.
    pub fn new(bindings: &[ModeBinding]) -> Result<Self, ConfigError> {
        let bindings = Vec::from_slice(bindings).map_err(|_| {
            ConfigError::ValidationError(format!(
                "{} mode bindings exceed capacity {MAX_MODE_BINDINGS}",
                bindings.len()
            ))
        })?;
        Ok(Self { bindings })
    }

    pub fn from_config(config: &ControlConfig) -> Result<Self, ConfigError> {
        Self::new(&config.modes)
    }

    /// Mode selected by `buttons`. Unbound values select `Free`.
    #[inline]
    pub fn mode_for(&self, buttons: ButtonState) -> ControlMode {
        let raw = buttons.raw();
        self.bindings
            .iter()
            .find(|b| b.buttons == raw)
            .map_or(ControlMode::Free, |b| b.mode)
    }

    pub fn bindings(&self) -> &[ModeBinding] {
        &self.bindings
    }
}

impl Default for ModeMap {
    fn default() -> Self {
        let mut bindings = Vec::new();
        for binding in ControlConfig::default().modes {
            // Capacity is asserted in consts; the default table always fits.
            let _ = bindings.push(binding);
        }
        Self { bindings }
    }
}

// ─── Hold Latch ─────────────────────────────────────────────────────

/// "Was held" flag per hold mode, carried between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoldLatch {
    pub clutch_held: bool,
    pub coag_held: bool,
}

impl HoldLatch {
    pub const fn new(clutch_held: bool, coag_held: bool) -> Self {
        Self {
            clutch_held,
            coag_held,
        }
    }

    /// Initial latch from the `clutch_pressed` / `coag_pressed` settings.
    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.clutch_pressed, config.coag_pressed)
    }

    /// Whether the latch for `mode` is set. Always false for `Free`.
    pub const fn is_held(&self, mode: ControlMode) -> bool {
        match mode {
            ControlMode::Free => false,
            ControlMode::Clutched => self.clutch_held,
            ControlMode::Coagulated => self.coag_held,
        }
    }

    pub(crate) fn set(&mut self, mode: ControlMode, held: bool) {
        match mode {
            ControlMode::Free => {}
            ControlMode::Clutched => self.clutch_held = held,
            ControlMode::Coagulated => self.coag_held = held,
        }
    }
}

/// Latch edge observed in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeEdge {
    #[default]
    None,
    /// Hold mode entered while its latch was clear.
    Pressed(ControlMode),
    /// Hold latch cleared in `Free`; the reference moved to the grip.
    Released(ControlMode),
}
