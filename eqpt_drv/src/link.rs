//! [`CommandLink`] over an I2C bus
//!
//! The motor microcontroller listens as an I2C slave and treats every byte written to it as a
//! command. Nothing is read back.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Debug;
use embedded_hal::blocking::i2c::Write;
use log::trace;

use eqpt_if::eqpt::link::{CommandLink, LinkError, RobCmd};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default slave address of the motor microcontroller
pub const DEFAULT_ADDRESS: u8 = 0x04;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct I2cLink<I2C> {
    i2c: I2C,
    address: u8
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C> I2cLink<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }
}

impl<I2C, E> CommandLink for I2cLink<I2C>
where
    I2C: Write<Error = E>,
    E: Debug
{
    fn send(&mut self, cmd: RobCmd) -> Result<(), LinkError> {
        trace!("Sending {:?} ({}) to {:#04x}", cmd, cmd.code(), self.address);

        self.i2c
            .write(self.address, &[cmd.code()])
            .map_err(|e| LinkError::Write(format!("{:?}", e)))
    }
}
