//! # Servo Controller Module
//!
//! This module provides [`ServoDriver`] implementations for servo driver boards, and the timing
//! calculations shared between them.
//!
//! [`ServoDriver`]: eqpt_if::eqpt::servo::ServoDriver

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
///
/// [`ServoDriver`]: eqpt_if::eqpt::servo::ServoDriver
pub mod pca9685;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use pca9685::Pca9685Board;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Frequency of the board's internal oscillator
pub const OSC_FREQ_HZ: f64 = 25_000_000.0;

/// Number of ticks in one PWM period
pub const TICKS_PER_PERIOD: f64 = 4096.0;

/// Frequency used for hobby servos
pub const SERVO_FREQ_HZ: f64 = 60.0;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Calculate the prescale register value which gives the closest PWM frequency to `freq_hz`.
///
/// Returns `None` if the frequency can't be produced by the board (prescale must be 3-255).
pub fn prescale_for(freq_hz: f64) -> Option<u8> {
    if !(freq_hz > 0.0) {
        return None
    }

    let prescale = (OSC_FREQ_HZ / TICKS_PER_PERIOD / freq_hz - 1.0 + 0.5).floor();

    if prescale < 3.0 || prescale > 255.0 {
        None
    }
    else {
        Some(prescale as u8)
    }
}

/// Length of one pulse tick in microseconds at the given frequency.
pub fn tick_length_us(freq_hz: f64) -> f64 {
    1_000_000.0 / freq_hz / TICKS_PER_PERIOD
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prescale() {
        assert_eq!(prescale_for(SERVO_FREQ_HZ), Some(101));
        assert_eq!(prescale_for(50.0), Some(121));
        assert_eq!(prescale_for(1526.0), Some(3));
        assert_eq!(prescale_for(10.0), None);
        assert_eq!(prescale_for(5000.0), None);
        assert_eq!(prescale_for(0.0), None);
        assert_eq!(prescale_for(f64::NAN), None);
    }

    #[test]
    fn test_tick_length() {
        // Roughly 4 us per tick at 60 Hz
        let t = tick_length_us(SERVO_FREQ_HZ);
        assert!(t > 4.0 && t < 4.1);
    }
}
