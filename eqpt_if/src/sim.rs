//! # Simulated Equipment
//!
//! Stand-ins for each piece of equipment which record everything done to them in a shared
//! [`Journal`]. They are used by the unit tests of the executables and when running away from the
//! Pi (`--sim`), where every actuation is logged at trace level instead.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::RefCell, collections::VecDeque, rc::Rc};
use embedded_hal::blocking::delay::DelayMs;
use log::trace;

use crate::eqpt::{
    audio::{AudioError, AudioSource},
    display::{RgbImage, Surface, SurfaceError},
    link::{CommandLink, LinkError, RobCmd},
    pad::{Gamepad, PadError, PadSnapshot},
    servo::{check_pulse, ServoChannel, ServoDriver, ServoError},
    vpad::{check_stick, VButton, VirtualPad, VirtualPadError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An ordered record of everything done to the simulated equipment sharing it.
#[derive(Clone, Default, Debug)]
pub struct Journal {
    events: Rc<RefCell<Vec<SimEvent>>>,

    /// Events are logged but not kept, for long running simulations
    log_only: bool,
}

/// Simulated servo driver board.
pub struct SimServoDriver {
    journal: Journal,
    failures: usize,
}

/// Simulated command link.
pub struct SimLink {
    journal: Journal,
    failures: usize,
}

/// Simulated gamepad which replays a script of snapshots, repeating the last one once the script
/// runs out.
pub struct SimGamepad {
    script: VecDeque<PadSnapshot>,
    last: PadSnapshot,
}

/// Simulated virtual pad.
pub struct SimVirtualPad {
    journal: Journal,
}

/// Simulated microphone which hands out queued chunks of audio.
pub struct SimAudio {
    chunks: VecDeque<Vec<f32>>,
    running: bool,
}

/// Simulated display.
pub struct SimSurface {
    journal: Journal,
    last_frame: Option<RgbImage>,
}

/// Delay which records the requested time without sleeping.
pub struct SimDelay {
    journal: Journal,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    PwmFreq(f64),
    Pulse { channel: u8, pulse: u16 },
    LinkByte(u8),
    Button { button: VButton, pressed: bool },
    Stick { x: i32, y: i32 },
    DelayMs(u16),
    Frame,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal which only logs events, so it doesn't grow while an executable runs.
    pub fn log_only() -> Self {
        Self {
            log_only: true,
            ..Self::default()
        }
    }

    pub fn record(&self, event: SimEvent) {
        trace!("sim: {:?}", event);

        if !self.log_only {
            self.events.borrow_mut().push(event);
        }
    }

    /// A copy of all events recorded so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.borrow().clone()
    }

    /// Remove all recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// All pulses written to the given channel, in order.
    pub fn pulses(&self, channel: u8) -> Vec<u16> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SimEvent::Pulse { channel: c, pulse } if *c == channel => Some(*pulse),
                _ => None,
            })
            .collect()
    }

    /// All bytes written to the command link, in order.
    pub fn link_bytes(&self) -> Vec<u8> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SimEvent::LinkByte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

impl SimServoDriver {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failures: 0,
        }
    }

    /// Make the next `count` pulse writes fail with an I2C error.
    pub fn fail_next(&mut self, count: usize) {
        self.failures = count;
    }
}

impl ServoDriver for SimServoDriver {
    fn set_pwm_freq(&mut self, freq_hz: f64) -> Result<(), ServoError> {
        self.journal.record(SimEvent::PwmFreq(freq_hz));
        Ok(())
    }

    fn set_pulse(&mut self, channel: ServoChannel, pulse: u16) -> Result<(), ServoError> {
        check_pulse(pulse)?;

        if self.failures > 0 {
            self.failures -= 1;
            return Err(ServoError::I2c("simulated failure".into()));
        }

        self.journal.record(SimEvent::Pulse {
            channel: channel.index(),
            pulse
        });
        Ok(())
    }
}

impl SimLink {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failures: 0,
        }
    }

    /// Make the next `count` sends fail.
    pub fn fail_next(&mut self, count: usize) {
        self.failures = count;
    }
}

impl CommandLink for SimLink {
    fn send(&mut self, cmd: RobCmd) -> Result<(), LinkError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(LinkError::Write("simulated failure".into()));
        }

        self.journal.record(SimEvent::LinkByte(cmd.code()));
        Ok(())
    }
}

impl SimGamepad {
    pub fn new<I: IntoIterator<Item = PadSnapshot>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: PadSnapshot::neutral(),
        }
    }
}

impl Gamepad for SimGamepad {
    fn poll(&mut self) -> Result<PadSnapshot, PadError> {
        if let Some(s) = self.script.pop_front() {
            self.last = s;
        }

        Ok(self.last)
    }
}

impl SimVirtualPad {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl VirtualPad for SimVirtualPad {
    fn set_button(&mut self, button: VButton, pressed: bool) -> Result<(), VirtualPadError> {
        self.journal.record(SimEvent::Button { button, pressed });
        Ok(())
    }

    fn set_stick(&mut self, x: i32, y: i32) -> Result<(), VirtualPadError> {
        check_stick(x, y)?;
        self.journal.record(SimEvent::Stick { x, y });
        Ok(())
    }
}

impl SimAudio {
    pub fn new<I: IntoIterator<Item = Vec<f32>>>(chunks: I) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl AudioSource for SimAudio {
    fn start(&mut self) -> Result<(), AudioError> {
        self.running = true;
        Ok(())
    }

    fn take_samples(&mut self) -> Vec<f32> {
        if !self.running {
            return Vec::new();
        }

        self.chunks.pop_front().unwrap_or_default()
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

impl SimSurface {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            last_frame: None,
        }
    }

    pub fn last_frame(&self) -> Option<&RgbImage> {
        self.last_frame.as_ref()
    }
}

impl Surface for SimSurface {
    fn present(&mut self, frame: &RgbImage) -> Result<(), SurfaceError> {
        self.journal.record(SimEvent::Frame);
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

impl SimDelay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl DelayMs<u16> for SimDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.journal.record(SimEvent::DelayMs(ms));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eqpt::pad::PadButton;

    #[test]
    fn test_journal_shared() {
        let journal = Journal::new();
        let mut servo = SimServoDriver::new(&journal);
        let mut link = SimLink::new(&journal);

        servo.set_pulse(ServoChannel::new(1).unwrap(), 480).unwrap();
        link.send(RobCmd::Home).unwrap();
        servo.set_pulse(ServoChannel::new(1).unwrap(), 483).unwrap();

        assert_eq!(journal.pulses(1), vec![480, 483]);
        assert_eq!(journal.link_bytes(), vec![5]);
        assert_eq!(journal.events().len(), 3);
    }

    #[test]
    fn test_log_only_keeps_nothing() {
        let journal = Journal::log_only();
        let mut link = SimLink::new(&journal);

        link.send(RobCmd::Open).unwrap();
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_failure_injection() {
        let journal = Journal::new();
        let mut link = SimLink::new(&journal);
        link.fail_next(1);

        assert!(link.send(RobCmd::Open).is_err());
        assert!(link.send(RobCmd::Open).is_ok());
        assert_eq!(journal.link_bytes(), vec![1]);
    }

    #[test]
    fn test_gamepad_repeats_last() {
        let held = PadSnapshot::neutral().with_pressed(PadButton::East);
        let mut pad = SimGamepad::new(vec![held]);

        assert_eq!(pad.poll().unwrap(), held);
        assert_eq!(pad.poll().unwrap(), held);
    }

    #[test]
    fn test_audio_only_when_running() {
        let mut audio = SimAudio::new(vec![vec![0.1; 4], vec![0.2; 4]]);

        assert!(audio.take_samples().is_empty());
        audio.start().unwrap();
        assert_eq!(audio.take_samples(), vec![0.1; 4]);
        audio.stop();
        assert!(!audio.is_running());
    }
}
