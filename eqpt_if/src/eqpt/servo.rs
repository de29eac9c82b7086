//! # Servo Equipment
//!
//! PWM servo driver boards (like the PCA9685) expose 16 channels, each taking a 12-bit pulse
//! value. ROB uses the board for its head pan, head tilt and body pan servos as well as its LED.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum pulse value (12 bits of resolution)
pub const MAX_PULSE: u16 = 4095;

/// Number of channels on a driver board
pub const NUM_CHANNELS: u8 = 16;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {

    /// Set the PWM frequency of the whole board.
    fn set_pwm_freq(&mut self, freq_hz: f64) -> Result<(), ServoError>;

    /// Set the pulse width of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set the pulse for
    /// - `pulse` - The on-time of the pulse in 12-bit ticks. Values above [`MAX_PULSE`] will be
    ///   rejected.
    fn set_pulse(&mut self, channel: ServoChannel, pulse: u16) -> Result<(), ServoError>;

}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A validated channel index on a servo driver board.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct ServoChannel(u8);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("An I2C error occured: {0}")]
    I2c(String),

    #[error("Channel must be less than 16, found {0}")]
    InvalidChannel(u8),

    #[error("Pulse must be at most 4095, found {0}")]
    InvalidPulse(u16),

    #[error("PWM frequency {0} Hz is outside the board's 24-1526 Hz range")]
    InvalidFrequency(f64)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ServoChannel {
    /// Create a new channel, checking it exists on the board.
    pub fn new(index: u8) -> Result<Self, ServoError> {
        if index < NUM_CHANNELS {
            Ok(Self(index))
        }
        else {
            Err(ServoError::InvalidChannel(index))
        }
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl std::convert::TryFrom<u8> for ServoChannel {
    type Error = ServoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServoChannel> for u8 {
    fn from(c: ServoChannel) -> Self {
        c.0
    }
}

impl std::fmt::Display for ServoChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Check a pulse value is representable by the board.
pub fn check_pulse(pulse: u16) -> Result<u16, ServoError> {
    if pulse > MAX_PULSE {
        Err(ServoError::InvalidPulse(pulse))
    }
    else {
        Ok(pulse)
    }
}
