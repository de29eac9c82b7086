//! # Equipment drivers
//!
//! Implementations of the [`eqpt_if`] capability traits for ROB's real hardware:
//! - Adafruit PCA9685 servo driver board
//! - The I2C link to the motor microcontroller
//! - USB gamepad (Pi only)
//! - uinput virtual gamepad (Pi only)
//! - Microphone capture (Pi only)
//! - Linux framebuffer display
//!
//! Drivers which need the Pi's peripherals or system libraries are only built for ARM targets, for
//! both the 32 and 64 bit Raspberry Pi OS.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Driver used to control servos.
pub mod servo_ctrl;

/// Single-byte I2C command link.
pub mod link;

/// Linux framebuffer surface.
pub mod framebuffer;

/// Blocking delay backed by the OS scheduler.
pub mod delay;

/// Physical gamepad backed by gilrs.
#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
pub mod gamepad;

/// Virtual gamepad backed by uinput.
#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
pub mod vpad;

/// Microphone capture backed by cpal.
#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
pub mod audio;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Returns true if the real hardware drivers were built into this binary.
pub const fn hardware_available() -> bool {
    cfg!(any(target_arch = "arm", target_arch = "aarch64"))
}

/// Open an I2C bus on the Pi.
#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
pub fn open_i2c(bus: u8) -> Result<rppal::i2c::I2c, rppal::i2c::Error> {
    rppal::i2c::I2c::with_bus(bus)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hardware_on_both_pi_targets() {
        let pi = cfg!(target_arch = "arm") || cfg!(target_arch = "aarch64");
        assert_eq!(hardware_available(), pi);

        if cfg!(target_arch = "x86_64") {
            assert!(!hardware_available());
        }
    }
}
