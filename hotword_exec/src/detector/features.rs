//! Log band energy features
//!
//! Each 25 ms frame of audio (10 ms apart) is reduced to the energy in a set of log-spaced
//! frequency bands. Energies are in bels relative to the frame's mean, so the features describe
//! the shape of the spectrum and not how loud it was.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

use eqpt_if::eqpt::audio::SAMPLE_RATE_HZ;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Samples per frame (25 ms)
pub const FRAME_LEN: usize = 400;

/// Samples between the starts of consecutive frames (10 ms)
pub const FRAME_HOP: usize = 160;

/// Number of frequency bands per frame
pub const NUM_BANDS: usize = 16;

/// Centre of the lowest band
const MIN_BAND_HZ: f64 = 150.0;

/// Centre of the highest band
const MAX_BAND_HZ: f64 = 4000.0;

/// Bands more than this far below the loudest in a frame are raised to it
///
/// Units: bels
const DYNAMIC_RANGE_B: f32 = 6.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Features of one frame.
pub type Frame = [f32; NUM_BANDS];

/// Computes features, holding the window and band coefficients.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    window: Vec<f64>,

    /// Goertzel coefficient `2 cos(w)` of each band
    coeffs: [f64; NUM_BANDS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FeatureExtractor {
    pub fn new() -> Self {
        let window = (0..FRAME_LEN)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (FRAME_LEN - 1) as f64).cos())
            .collect();

        let mut coeffs = [0.0; NUM_BANDS];
        let ratio = (MAX_BAND_HZ / MIN_BAND_HZ).powf(1.0 / (NUM_BANDS - 1) as f64);
        for (i, c) in coeffs.iter_mut().enumerate() {
            let freq = MIN_BAND_HZ * ratio.powi(i as i32);
            let w = 2.0 * PI * freq / SAMPLE_RATE_HZ as f64;
            *c = 2.0 * w.cos();
        }

        Self { window, coeffs }
    }

    /// Features of every whole frame in the samples.
    pub fn extract(&self, samples: &[f32]) -> Vec<Frame> {
        if samples.len() < FRAME_LEN {
            return Vec::new()
        }

        let num_frames = (samples.len() - FRAME_LEN) / FRAME_HOP + 1;

        (0..num_frames)
            .map(|i| self.frame(&samples[i * FRAME_HOP..i * FRAME_HOP + FRAME_LEN]))
            .collect()
    }

    fn frame(&self, samples: &[f32]) -> Frame {
        let windowed: Vec<f64> = samples
            .iter()
            .zip(self.window.iter())
            .map(|(s, w)| *s as f64 * w)
            .collect();

        let mut frame = [0f32; NUM_BANDS];
        for (f, c) in frame.iter_mut().zip(self.coeffs.iter()) {
            *f = (goertzel_power(&windowed, *c) + 1e-12).log10() as f32;
        }

        // Limit the range, then remove the frame's level
        let max = frame.iter().cloned().fold(f32::MIN, f32::max);
        for f in frame.iter_mut() {
            *f = f.max(max - DYNAMIC_RANGE_B);
        }
        let mean = frame.iter().sum::<f32>() / NUM_BANDS as f32;
        for f in frame.iter_mut() {
            *f -= mean;
        }

        frame
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// RMS difference between two frames.
pub fn frame_distance(a: &Frame, b: &Frame) -> f32 {
    let sum: f32 = a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    (sum / NUM_BANDS as f32).sqrt()
}

/// Power of one frequency in a block of samples.
fn goertzel_power(samples: &[f64], coeff: f64) -> f64 {
    let (mut s1, mut s2) = (0.0, 0.0);

    for x in samples {
        let s0 = x + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }

    s1 * s1 + s2 * s2 - coeff * s1 * s2
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn tone(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / 16000.0).sin())
            .collect()
    }

    fn loudest_band(frame: &Frame) -> usize {
        let mut best = 0;
        for i in 0..NUM_BANDS {
            if frame[i] > frame[best] {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_frame_count() {
        let fe = FeatureExtractor::new();

        assert!(fe.extract(&[0.0; 399]).is_empty());
        assert_eq!(fe.extract(&[0.0; 400]).len(), 1);
        assert_eq!(fe.extract(&[0.0; 6400]).len(), 38);
    }

    #[test]
    fn test_band_follows_frequency() {
        let fe = FeatureExtractor::new();

        let low = fe.extract(&tone(150.0, 0.5, 400));
        let high = fe.extract(&tone(4000.0, 0.5, 400));

        assert_eq!(loudest_band(&low[0]), 0);
        assert_eq!(loudest_band(&high[0]), NUM_BANDS - 1);
    }

    #[test]
    fn test_level_independent() {
        let fe = FeatureExtractor::new();

        let quiet = fe.extract(&tone(800.0, 0.1, 400));
        let loud = fe.extract(&tone(800.0, 0.8, 400));

        assert!(frame_distance(&quiet[0], &loud[0]) < 1e-3);
    }

    #[test]
    fn test_distance() {
        let fe = FeatureExtractor::new();

        let a = fe.extract(&tone(300.0, 0.5, 400));
        let b = fe.extract(&tone(3000.0, 0.5, 400));

        assert_eq!(frame_distance(&a[0], &a[0]), 0.0);
        assert!(frame_distance(&a[0], &b[0]) > 1.0);
    }
}
