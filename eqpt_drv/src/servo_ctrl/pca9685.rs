//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Debug;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::debug;
use pwm_pca9685::{Address, Channel, Pca9685};

use eqpt_if::eqpt::servo::{check_pulse, ServoChannel, ServoDriver, ServoError};
use super::prescale_for;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default I2C address of the board
pub const DEFAULT_ADDRESS: u8 = 0x40;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A PCA9685 board on an I2C bus.
pub struct Pca9685Board<I2C> {
    pwm: Pca9685<I2C>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> Pca9685Board<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug
{
    /// Create the driver for the board at `address` and enable its outputs.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, ServoError> {
        let mut pwm = Pca9685::new(i2c, Address::from(address))
            .map_err(map_err)?;

        pwm.enable().map_err(map_err)?;

        debug!("PCA9685 at {:#04x} enabled", address);

        Ok(Self { pwm })
    }

    /// Release the underlying bus.
    pub fn destroy(self) -> I2C {
        self.pwm.destroy()
    }
}

impl<I2C, E> ServoDriver for Pca9685Board<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug
{
    fn set_pwm_freq(&mut self, freq_hz: f64) -> Result<(), ServoError> {
        let prescale = prescale_for(freq_hz)
            .ok_or(ServoError::InvalidFrequency(freq_hz))?;

        debug!("Setting PWM frequency to {} Hz (prescale {})", freq_hz, prescale);

        self.pwm.set_prescale(prescale).map_err(map_err)
    }

    fn set_pulse(&mut self, channel: ServoChannel, pulse: u16) -> Result<(), ServoError> {
        let pulse = check_pulse(pulse)?;

        // The pulse starts at the beginning of the period and ends `pulse` ticks later
        self.pwm
            .set_channel_on_off(to_pca_channel(channel), 0, pulse)
            .map_err(map_err)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn map_err<E: Debug>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(e) => ServoError::I2c(format!("{:?}", e)),
        pwm_pca9685::Error::InvalidInputData => ServoError::I2c("invalid input data".into())
    }
}

fn to_pca_channel(channel: ServoChannel) -> Channel {
    match channel.index() {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        // ServoChannel only holds 0-15
        _ => Channel::C15,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_channel_mapping() {
        assert_eq!(to_pca_channel(ServoChannel::new(0).unwrap()), Channel::C0);
        assert_eq!(to_pca_channel(ServoChannel::new(4).unwrap()), Channel::C4);
        assert_eq!(to_pca_channel(ServoChannel::new(15).unwrap()), Channel::C15);
    }
}
