//! Hotword loop execution
//!
//! Pulls whatever audio the microphone has captured, runs it through the detector and dispatches
//! any hotword found, then sleeps briefly before checking again.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::{thread, time::Duration};
use thiserror::Error;

// Internal
use crate::{
    detector::HotwordDetector,
    dispatch::{DispatchError, Dispatcher},
};
use eqpt_if::eqpt::audio::{AudioError, AudioSource};
use util::shutdown::ShutdownFlag;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct HotwordExec {
    detector: HotwordDetector,
    dispatcher: Dispatcher,
    audio: Box<dyn AudioSource>,

    /// Pause between checks for new audio
    sleep: Duration,

    num_detections: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Dispatcher startup failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Could not start audio capture: {0}")]
    Audio(#[from] AudioError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HotwordExec {
    pub fn new(
        detector: HotwordDetector,
        dispatcher: Dispatcher,
        audio: Box<dyn AudioSource>,
        sleep_time_ms: u64,
    ) -> Self {
        Self {
            detector,
            dispatcher,
            audio,
            sleep: Duration::from_millis(sleep_time_ms),
            num_detections: 0,
        }
    }

    /// Bring the outputs to idle and start listening.
    pub fn startup(&mut self, pwm_freq_hz: f64) -> Result<(), ExecError> {
        self.dispatcher.startup(pwm_freq_hz)?;
        self.audio.start()?;

        info!("Listening... Press Ctrl+C to exit");

        Ok(())
    }

    /// Process the audio captured since the last step, dispatching any detected hotword.
    ///
    /// Returns the index of the hotword dispatched.
    pub fn step(&mut self) -> Option<usize> {
        let samples = self.audio.take_samples();
        if samples.is_empty() {
            return None
        }

        let index = self.detector.process(&samples)?;

        self.dispatcher.dispatch(index);
        self.num_detections += 1;

        Some(index)
    }

    /// Step until shutdown is requested, then stop the microphone.
    pub fn run(&mut self, shutdown: &ShutdownFlag) {
        while !shutdown.is_raised() {
            self.step();
            thread::sleep(self.sleep);
        }

        self.audio.stop();
        self.detector.reset();

        info!("Stopped after {} hotwords", self.num_detections);
    }

    pub fn num_detections(&self) -> u64 {
        self.num_detections
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
