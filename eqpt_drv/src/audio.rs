//! [`AudioSource`] implementation capturing from the default microphone with cpal

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, SampleRate, Stream, StreamConfig,
};
use log::{debug, error};

use eqpt_if::eqpt::audio::{AudioError, AudioSource, SAMPLE_RATE_HZ};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Captures mono audio from the default input device.
///
/// Samples are pushed into a shared buffer by the driver's callback and drained by
/// [`AudioSource::take_samples`].
pub struct MicCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MicCapture {
    /// Find the default input device and a mono 16 kHz configuration for it.
    pub fn open() -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| AudioError::Stream(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE_HZ)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE_HZ)
            })
            .ok_or(AudioError::NoSuitableConfig(SAMPLE_RATE_HZ))?;

        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE_HZ)).config();

        debug!(
            "Audio input {} opened at {} Hz",
            device.name().unwrap_or_default(),
            SAMPLE_RATE_HZ
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None
        })
    }
}

impl AudioSource for MicCapture {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(())
        }

        let buffer = Arc::clone(&self.buffer);

        let stream = self.device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |e| error!("Audio capture error: {}", e),
                None
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;
        self.stream = Some(stream);

        debug!("Audio capture started");
        Ok(())
    }

    fn take_samples(&mut self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Audio capture stopped");
        }
    }
}
