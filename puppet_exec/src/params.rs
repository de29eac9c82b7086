//! # Puppet Executable Parameters
//!
//! This module provides the parameters of the puppet loop, loaded from `puppet_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use crate::settings::MAX_HEAD_TILT;
use eqpt_if::eqpt::{
    pad::{PadAxis, PadButton},
    servo::{ServoChannel, MAX_PULSE},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct PuppetExecParams {

    /// Frequency of the main control loop
    ///
    /// Units: hertz
    pub cycle_frequency_hz: f64,

    /// I2C bus the servo board and the motor microcontroller share
    pub i2c_bus: u8,

    /// I2C address of the PCA9685 servo board
    pub pwm_address: u8,

    /// PWM frequency of the servo board
    ///
    /// Units: hertz
    pub pwm_freq_hz: f64,

    /// I2C address of the motor microcontroller
    pub link_address: u8,

    /// File the head tilt is persisted in, relative to the software root unless absolute
    pub settings_file: String,

    /// Command (and arguments) run on exit to re-enable the projector. Empty to disable.
    #[serde(default)]
    pub projector_hook: Vec<String>,

    /// Framebuffer device the crosshair is shown on
    pub framebuffer: String,

    /// The LED channel and pulse used to light ROB's LED
    pub led: LedParams,

    pub head_pan: ServoParams,
    pub head_tilt: ServoParams,
    pub body_pan: ServoParams,

    /// Amount the head tilt pulse changes per repeat while a tilt button is held
    ///
    /// Units: 12-bit ticks
    pub tilt_step: u16,

    pub timing: TimingParams,
    pub buttons: ButtonMap,
    pub axes: AxisMap,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct LedParams {
    pub channel: ServoChannel,
    pub on_pulse: u16,
}

/// Pulse range of one servo.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ServoParams {
    pub channel: ServoChannel,

    /// Pulse at one end of travel
    pub min: u16,

    /// Pulse at the other end of travel
    pub max: u16,

    /// Pulse the servo is sent to at startup
    pub home: u16,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct TimingParams {
    /// Minimum spacing between accepted presses of the same control, and between commands sent
    /// on the link
    pub debounce_ms: u64,

    /// Interval between tilt steps while a tilt button is held
    pub tilt_repeat_ms: u64,

    /// Time given to each servo to reach its home position at startup
    pub settle_ms: u16,
}

/// Which pad button performs which function.
#[derive(Deserialize, Debug, Clone)]
pub struct ButtonMap {
    pub open: PadButton,
    pub close: PadButton,
    pub up: PadButton,
    pub down: PadButton,
    pub home: PadButton,
    pub tilt_up: PadButton,
    pub tilt_down: PadButton,
    pub head_freeze: PadButton,
    pub body_follow: PadButton,

    /// Buttons which must be held together to exit
    pub exit_chord: [PadButton; 2],
}

/// Which pad axis drives which servo.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct AxisMap {
    pub head_pan: PadAxis,
    pub body_pan: PadAxis,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Servo range for {0} is invalid: {1}")]
    InvalidServoRange(&'static str, String),

    #[error("Servo channels must all be different")]
    NonUniqueChannels,

    #[error("The exit chord must be two different buttons")]
    InvalidExitChord,

    #[error("Button {0:?} is assigned more than one function")]
    NonUniqueButton(PadButton),

    #[error("Cycle frequency must be positive, found {0}")]
    InvalidCycleFrequency(f64),

    #[error("LED pulse must be at most 4095, found {0}")]
    InvalidLedPulse(u16),

    #[error("Head tilt max ({0}) must be at most 999 so the tilt fits in the settings file")]
    HeadTiltNotPersistable(u16),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PuppetExecParams {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.cycle_frequency_hz > 0.0) {
            return Err(ParamsError::InvalidCycleFrequency(self.cycle_frequency_hz))
        }

        if self.led.on_pulse > MAX_PULSE {
            return Err(ParamsError::InvalidLedPulse(self.led.on_pulse))
        }

        self.head_pan.is_valid("head_pan")?;
        self.head_tilt.is_valid("head_tilt")?;
        self.body_pan.is_valid("body_pan")?;

        if self.head_tilt.max > MAX_HEAD_TILT {
            return Err(ParamsError::HeadTiltNotPersistable(self.head_tilt.max))
        }

        // Non unique channels
        let channels = [
            self.led.channel,
            self.head_pan.channel,
            self.head_tilt.channel,
            self.body_pan.channel
        ];
        for c in channels.iter() {
            if channels.iter().filter(|&o| o == c).count() > 1 {
                return Err(ParamsError::NonUniqueChannels)
            }
        }

        // Exit chord
        if self.buttons.exit_chord[0] == self.buttons.exit_chord[1] {
            return Err(ParamsError::InvalidExitChord)
        }

        // Non unique buttons
        let buttons = self.buttons.all();
        for b in buttons.iter() {
            if buttons.iter().filter(|&o| o == b).count() > 1 {
                return Err(ParamsError::NonUniqueButton(*b))
            }
        }

        Ok(())
    }
}

impl ServoParams {
    /// Check the range is ordered, representable by the board, and contains the home position.
    pub fn is_valid(&self, name: &'static str) -> Result<(), ParamsError> {
        if self.min >= self.max {
            return Err(ParamsError::InvalidServoRange(
                name,
                format!("min ({}) must be less than max ({})", self.min, self.max)
            ))
        }

        if self.max > MAX_PULSE {
            return Err(ParamsError::InvalidServoRange(
                name,
                format!("max ({}) must be at most {}", self.max, MAX_PULSE)
            ))
        }

        if !self.contains(self.home) {
            return Err(ParamsError::InvalidServoRange(
                name,
                format!("home ({}) must be between min and max", self.home)
            ))
        }

        Ok(())
    }

    pub fn contains(&self, pulse: u16) -> bool {
        pulse >= self.min && pulse <= self.max
    }
}

impl ButtonMap {
    /// Every button with a function, the exit chord included.
    pub fn all(&self) -> Vec<PadButton> {
        vec![
            self.open,
            self.close,
            self.up,
            self.down,
            self.home,
            self.tilt_up,
            self.tilt_down,
            self.head_freeze,
            self.body_follow,
            self.exit_chord[0],
            self.exit_chord[1],
        ]
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

/// Parameters matching the shipped `puppet_exec.toml`, for use in tests.
#[cfg(test)]
pub(crate) fn test_params() -> PuppetExecParams {
    util::params::from_str(include_str!("../../params/puppet_exec.toml"))
        .expect("shipped puppet_exec.toml is invalid")
}
