//! [`VirtualPad`] implementation using a uinput device

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisType, AttributeSet, EventType, InputEvent, Key, UinputAbsSetup,
};
use log::debug;

use eqpt_if::eqpt::vpad::{
    check_stick, VButton, VirtualPad, VirtualPadError, AXIS_CENTRE, AXIS_MAX, AXIS_MIN,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A two button gamepad with one analog stick, registered with the kernel's input subsystem.
pub struct UinputPad {
    device: VirtualDevice
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl UinputPad {
    /// Create the device. Requires write access to `/dev/uinput`.
    pub fn create(name: &str) -> Result<Self, VirtualPadError> {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_0);
        keys.insert(Key::BTN_1);

        let abs_x = UinputAbsSetup::new(
            AbsoluteAxisType::ABS_X,
            AbsInfo::new(AXIS_CENTRE, AXIS_MIN, AXIS_MAX, 0, 0, 0)
        );
        let abs_y = UinputAbsSetup::new(
            AbsoluteAxisType::ABS_Y,
            AbsInfo::new(AXIS_CENTRE, AXIS_MIN, AXIS_MAX, 0, 0, 0)
        );

        let device = VirtualDeviceBuilder::new()
            .and_then(|b| b.name(name).with_keys(&keys))
            .and_then(|b| b.with_absolute_axis(&abs_x))
            .and_then(|b| b.with_absolute_axis(&abs_y))
            .and_then(|b| b.build())
            .map_err(|e| VirtualPadError::Create(e.to_string()))?;

        debug!("Created virtual gamepad \"{}\"", name);

        Ok(Self { device })
    }

    fn emit(&mut self, events: &[InputEvent]) -> Result<(), VirtualPadError> {
        self.device
            .emit(events)
            .map_err(|e| VirtualPadError::Emit(e.to_string()))
    }
}

impl VirtualPad for UinputPad {
    fn set_button(&mut self, button: VButton, pressed: bool) -> Result<(), VirtualPadError> {
        let key = match button {
            VButton::A => Key::BTN_0,
            VButton::B => Key::BTN_1,
        };

        self.emit(&[InputEvent::new(EventType::KEY, key.code(), pressed as i32)])
    }

    fn set_stick(&mut self, x: i32, y: i32) -> Result<(), VirtualPadError> {
        check_stick(x, y)?;

        self.emit(&[
            InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, x),
            InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_Y.0, y),
        ])
    }
}
