//! Blocking delay

use std::{thread, time::Duration};
use embedded_hal::blocking::delay::DelayMs;

/// Delay which puts the calling thread to sleep.
#[derive(Default, Debug, Clone, Copy)]
pub struct StdDelay;

impl DelayMs<u16> for StdDelay {
    fn delay_ms(&mut self, ms: u16) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

