//! # Hotword Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use eqpt_if::eqpt::{servo::{ServoChannel, MAX_PULSE}, vpad::PadAction};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct HotwordExecParams {

    /// Minimum score, between 0 and 1, for an utterance to count as a hotword
    pub sensitivity: f32,

    /// Multiplier applied to the microphone samples before detection
    pub audio_gain: f32,

    /// Time between checks for new audio
    ///
    /// Units: milliseconds
    pub sleep_time_ms: u64,

    /// I2C bus of the servo board
    pub i2c_bus: u8,

    /// I2C address of the PCA9685 servo board
    pub pwm_address: u8,

    /// PWM frequency of the servo board
    ///
    /// Units: hertz
    pub pwm_freq_hz: f64,

    /// Name the virtual gamepad is registered with
    pub vpad_name: String,

    pub led: LedParams,

    pub detector: DetectorParams,

    /// Hotword templates and the action each one triggers, in detection order
    pub bindings: Vec<BindingParams>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct LedParams {
    pub channel: ServoChannel,
    pub on_pulse: u16,

    /// Length of each step of the flash sequence
    ///
    /// Units: milliseconds
    pub flash_step_ms: u16,
}

/// Settings of the utterance segmenter.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    /// RMS level above which a block of audio counts as speech
    pub energy_threshold: f32,

    /// Utterances shorter than this are ignored
    pub min_speech_ms: u32,

    /// Silence which ends an utterance
    pub trailing_silence_ms: u32,

    /// Utterances are cut off at this length
    pub max_utterance_ms: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BindingParams {
    /// WAV recording of the hotword, relative to the software root unless absolute
    pub model: String,

    pub action: PadAction,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Sensitivity must be between 0 and 1, found {0}")]
    InvalidSensitivity(f32),

    #[error("Audio gain must be positive, found {0}")]
    InvalidAudioGain(f32),

    #[error("LED pulse must be at most 4095, found {0}")]
    InvalidLedPulse(u16),

    #[error("At least one hotword binding is required")]
    NoBindings,

    #[error("Invalid detector parameters: {0}")]
    InvalidDetector(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            energy_threshold: 0.02,
            min_speech_ms: 200,
            trailing_silence_ms: 300,
            max_utterance_ms: 3000,
        }
    }
}

impl HotwordExecParams {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(ParamsError::InvalidSensitivity(self.sensitivity))
        }

        if !(self.audio_gain > 0.0) {
            return Err(ParamsError::InvalidAudioGain(self.audio_gain))
        }

        if self.led.on_pulse > MAX_PULSE {
            return Err(ParamsError::InvalidLedPulse(self.led.on_pulse))
        }

        if self.bindings.is_empty() {
            return Err(ParamsError::NoBindings)
        }

        let d = &self.detector;
        if !(d.energy_threshold > 0.0) {
            return Err(ParamsError::InvalidDetector(
                format!("energy_threshold must be positive, found {}", d.energy_threshold)
            ))
        }
        if d.min_speech_ms >= d.max_utterance_ms {
            return Err(ParamsError::InvalidDetector(
                "min_speech_ms must be less than max_utterance_ms".into()
            ))
        }
        if d.trailing_silence_ms == 0 {
            return Err(ParamsError::InvalidDetector(
                "trailing_silence_ms must be positive".into()
            ))
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

/// Parameters matching the shipped `hotword_exec.toml`, for use in tests.
#[cfg(test)]
pub(crate) fn test_params() -> HotwordExecParams {
    util::params::from_str(include_str!("../../params/hotword_exec.toml"))
        .expect("shipped hotword_exec.toml is invalid")
}
