//! # Virtual Gamepad Equipment
//!
//! The hotword dispatcher presents itself to the host (and so to the emulator running the game)
//! as a gamepad with two buttons and an analog stick. Emulator front ends won't recognise a
//! controller without at least an x/y axis, so the stick is always present and held centred.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Minimum stick axis value
pub const AXIS_MIN: i32 = 0;

/// Maximum stick axis value
pub const AXIS_MAX: i32 = 255;

/// Centred stick axis value
pub const AXIS_CENTRE: i32 = 128;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A synthesized gamepad device.
pub trait VirtualPad {
    /// Emit a press (`true`) or release (`false`) of a button.
    fn set_button(&mut self, button: VButton, pressed: bool) -> Result<(), VirtualPadError>;

    /// Move the stick to an absolute position. Values must be within
    /// [`AXIS_MIN`]..=[`AXIS_MAX`].
    fn set_stick(&mut self, x: i32, y: i32) -> Result<(), VirtualPadError>;

    /// Return the stick to its centre.
    fn centre_stick(&mut self) -> Result<(), VirtualPadError> {
        self.set_stick(AXIS_CENTRE, AXIS_CENTRE)
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Buttons on the virtual pad.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VButton {
    /// First button (`BTN_0`)
    A,

    /// Second button (`BTN_1`)
    B
}

/// An action on the virtual pad.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadAction {
    Press(VButton),
    Release(VButton)
}

#[derive(thiserror::Error, Debug)]
pub enum VirtualPadError {
    #[error("Could not create the virtual device: {0}")]
    Create(String),

    #[error("Could not emit an event: {0}")]
    Emit(String),

    #[error("Stick position ({0}, {1}) is outside 0-255")]
    InvalidStick(i32, i32)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PadAction {
    /// Apply this action to a virtual pad.
    pub fn apply<V: VirtualPad + ?Sized>(self, vpad: &mut V) -> Result<(), VirtualPadError> {
        match self {
            PadAction::Press(b) => vpad.set_button(b, true),
            PadAction::Release(b) => vpad.set_button(b, false),
        }
    }
}

/// Check a stick position is within the axis range.
pub fn check_stick(x: i32, y: i32) -> Result<(), VirtualPadError> {
    let range = AXIS_MIN..=AXIS_MAX;

    if range.contains(&x) && range.contains(&y) {
        Ok(())
    }
    else {
        Err(VirtualPadError::InvalidStick(x, y))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_stick() {
        assert!(check_stick(AXIS_CENTRE, AXIS_CENTRE).is_ok());
        assert!(check_stick(0, 255).is_ok());
        assert!(matches!(check_stick(256, 0), Err(VirtualPadError::InvalidStick(256, 0))));
        assert!(check_stick(0, -1).is_err());
    }
}
