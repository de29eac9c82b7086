//! [`Gamepad`] implementation using gilrs

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use log::{info, warn};

use eqpt_if::eqpt::pad::{Gamepad, PadAxis, PadButton, PadError, PadSnapshot};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The first gamepad gilrs finds. If it disconnects another connected pad is used instead.
pub struct GilrsPad {
    gilrs: Gilrs,
    active: Option<GamepadId>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GilrsPad {
    /// Open the gamepad subsystem, failing if no pad is connected.
    pub fn open() -> Result<Self, PadError> {
        let gilrs = Gilrs::new().map_err(|e| PadError::Backend(e.to_string()))?;

        let mut pad = Self { gilrs, active: None };
        pad.select_pad()?;

        Ok(pad)
    }

    fn select_pad(&mut self) -> Result<GamepadId, PadError> {
        let (id, gp) = self.gilrs
            .gamepads()
            .find(|(_, gp)| gp.is_connected())
            .ok_or(PadError::NotConnected)?;

        info!("Using gamepad {} ({:?})", gp.name(), id);
        self.active = Some(id);

        Ok(id)
    }
}

impl Gamepad for GilrsPad {
    fn poll(&mut self) -> Result<PadSnapshot, PadError> {
        // Drain events so gilrs' cached state is up to date
        while let Some(ev) = self.gilrs.next_event() {
            if ev.event == EventType::Disconnected && Some(ev.id) == self.active {
                warn!("Gamepad {:?} disconnected", ev.id);
                self.active = None;
            }
        }

        let id = match self.active {
            Some(id) => id,
            None => self.select_pad()?
        };

        let gp = self.gilrs.gamepad(id);
        let mut snapshot = PadSnapshot::neutral();

        for b in PadButton::ALL.iter() {
            snapshot.set_pressed(*b, gp.is_pressed(to_gilrs_button(*b)));
        }
        for a in PadAxis::ALL.iter() {
            snapshot.set_axis(*a, gp.value(to_gilrs_axis(*a)));
        }

        Ok(snapshot)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn to_gilrs_button(button: PadButton) -> Button {
    match button {
        PadButton::South => Button::South,
        PadButton::East => Button::East,
        PadButton::North => Button::North,
        PadButton::West => Button::West,
        PadButton::LeftShoulder => Button::LeftTrigger,
        PadButton::RightShoulder => Button::RightTrigger,
        PadButton::LeftTrigger => Button::LeftTrigger2,
        PadButton::RightTrigger => Button::RightTrigger2,
        PadButton::Select => Button::Select,
        PadButton::Start => Button::Start,
        PadButton::Mode => Button::Mode,
        PadButton::LeftThumb => Button::LeftThumb,
        PadButton::RightThumb => Button::RightThumb,
        PadButton::DPadUp => Button::DPadUp,
        PadButton::DPadDown => Button::DPadDown,
        PadButton::DPadLeft => Button::DPadLeft,
        PadButton::DPadRight => Button::DPadRight,
    }
}

fn to_gilrs_axis(axis: PadAxis) -> Axis {
    match axis {
        PadAxis::LeftStickX => Axis::LeftStickX,
        PadAxis::LeftStickY => Axis::LeftStickY,
        PadAxis::RightStickX => Axis::RightStickX,
        PadAxis::RightStickY => Axis::RightStickY,
    }
}
