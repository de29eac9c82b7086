//! # Physical Gamepad Equipment
//!
//! The puppeteer holds a USB gamepad. Each cycle the controller reads a [`PadSnapshot`] of every
//! button and stick on it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of buttons tracked in a snapshot
pub const NUM_BUTTONS: usize = 17;

/// Number of axes tracked in a snapshot
pub const NUM_AXES: usize = 4;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A gamepad that can be polled for its current state.
pub trait Gamepad {
    /// Process any pending events and return the current state of the pad.
    fn poll(&mut self) -> Result<PadSnapshot, PadError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The state of every button and axis at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PadSnapshot {
    buttons: [bool; NUM_BUTTONS],
    axes: [f32; NUM_AXES]
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Buttons on the pad, named by position (Xbox-style layout).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    South,
    East,
    North,
    West,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    Mode,
    LeftThumb,
    RightThumb,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight
}

/// Analog axes on the pad. All axes report values in `[-1, 1]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadAxis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY
}

#[derive(thiserror::Error, Debug)]
pub enum PadError {
    #[error("No gamepad is connected")]
    NotConnected,

    #[error("Gamepad backend error: {0}")]
    Backend(String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PadButton {
    pub const ALL: [PadButton; NUM_BUTTONS] = [
        PadButton::South,
        PadButton::East,
        PadButton::North,
        PadButton::West,
        PadButton::LeftShoulder,
        PadButton::RightShoulder,
        PadButton::LeftTrigger,
        PadButton::RightTrigger,
        PadButton::Select,
        PadButton::Start,
        PadButton::Mode,
        PadButton::LeftThumb,
        PadButton::RightThumb,
        PadButton::DPadUp,
        PadButton::DPadDown,
        PadButton::DPadLeft,
        PadButton::DPadRight,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl PadAxis {
    pub const ALL: [PadAxis; NUM_AXES] = [
        PadAxis::LeftStickX,
        PadAxis::LeftStickY,
        PadAxis::RightStickX,
        PadAxis::RightStickY,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl PadSnapshot {
    /// A snapshot with nothing pressed and all sticks centred.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, button: PadButton) -> bool {
        self.buttons[button.index()]
    }

    pub fn axis(&self, axis: PadAxis) -> f32 {
        self.axes[axis.index()]
    }

    pub fn set_pressed(&mut self, button: PadButton, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }

    /// Set an axis value, clamping it into `[-1, 1]`. NaN reads as centred.
    pub fn set_axis(&mut self, axis: PadAxis, value: f32) {
        self.axes[axis.index()] = if value.is_nan() {
            0.0
        }
        else {
            value.max(-1.0).min(1.0)
        };
    }

    /// Builder form of [`PadSnapshot::set_pressed`] setting the button pressed.
    pub fn with_pressed(mut self, button: PadButton) -> Self {
        self.set_pressed(button, true);
        self
    }

    /// Builder form of [`PadSnapshot::set_axis`].
    pub fn with_axis(mut self, axis: PadAxis, value: f32) -> Self {
        self.set_axis(axis, value);
        self
    }

    /// Iterate over the buttons currently held.
    pub fn pressed(&self) -> impl Iterator<Item = PadButton> + '_ {
        PadButton::ALL.iter().copied().filter(move |b| self.is_pressed(*b))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_snapshot() {
        let s = PadSnapshot::neutral()
            .with_pressed(PadButton::Select)
            .with_pressed(PadButton::Start)
            .with_axis(PadAxis::RightStickX, 3.0)
            .with_axis(PadAxis::LeftStickY, f32::NAN);

        assert!(s.is_pressed(PadButton::Select));
        assert!(s.is_pressed(PadButton::Start));
        assert!(!s.is_pressed(PadButton::South));
        assert_eq!(s.axis(PadAxis::RightStickX), 1.0);
        assert_eq!(s.axis(PadAxis::LeftStickY), 0.0);
        assert_eq!(s.axis(PadAxis::LeftStickX), 0.0);
        assert_eq!(
            s.pressed().collect::<Vec<_>>(),
            vec![PadButton::Select, PadButton::Start]
        );
    }

    #[test]
    fn test_button_order_matches_indices() {
        for (i, b) in PadButton::ALL.iter().enumerate() {
            assert_eq!(b.index(), i);
        }
        for (i, a) in PadAxis::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
        }
    }
}
