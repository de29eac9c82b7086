//! # Audio Input Equipment

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Sample rate used for speech capture and hotword templates
pub const SAMPLE_RATE_HZ: u32 = 16000;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of mono audio samples in `[-1, 1]` at [`SAMPLE_RATE_HZ`].
pub trait AudioSource {
    /// Start capturing. Calling this on a running source does nothing.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Take all samples captured since the last call.
    fn take_samples(&mut self) -> Vec<f32>;

    /// Stop capturing and release the device.
    fn stop(&mut self);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("No input configuration supports mono {0} Hz capture")]
    NoSuitableConfig(u32),

    #[error("Audio stream error: {0}")]
    Stream(String)
}
