//! Energy gated utterance segmenter
//!
//! Audio is examined in short blocks. A block whose RMS level is above the threshold starts an
//! utterance, which continues until enough quiet blocks follow it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use crate::params::DetectorParams;
use eqpt_if::eqpt::audio::SAMPLE_RATE_HZ;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of samples in each block the gate examines (10 ms)
pub const BLOCK_LEN: usize = (SAMPLE_RATE_HZ / 100) as usize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Segmenter {
    threshold: f32,
    min_speech: usize,
    trailing_silence: usize,
    max_utterance: usize,

    state: SegmenterState,

    /// Samples not yet making up a whole block
    pending: Vec<f32>,

    /// The utterance so far, from its first loud block
    utterance: Vec<f32>,

    /// Samples since the last loud block
    silence: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,

    /// In an utterance
    Speech,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Segmenter {
    pub fn new(params: &DetectorParams) -> Self {
        Self {
            threshold: params.energy_threshold,
            min_speech: ms_to_samples(params.min_speech_ms),
            trailing_silence: ms_to_samples(params.trailing_silence_ms),
            max_utterance: ms_to_samples(params.max_utterance_ms),
            state: SegmenterState::Idle,
            pending: Vec::with_capacity(BLOCK_LEN),
            utterance: Vec::new(),
            silence: 0,
        }
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Feed samples in, returning any utterances they complete.
    ///
    /// Completed utterances have their trailing silence removed.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        let mut complete = Vec::new();

        self.pending.extend_from_slice(samples);
        let num_blocks = self.pending.len() / BLOCK_LEN;

        for i in 0..num_blocks {
            let block: Vec<f32> = self.pending[i * BLOCK_LEN..(i + 1) * BLOCK_LEN].to_vec();

            if let Some(u) = self.push_block(&block) {
                complete.push(u);
            }
        }

        self.pending.drain(..num_blocks * BLOCK_LEN);

        complete
    }

    /// Drop any partial utterance.
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.pending.clear();
        self.utterance.clear();
        self.silence = 0;
    }

    fn push_block(&mut self, block: &[f32]) -> Option<Vec<f32>> {
        let loud = is_loud(block, self.threshold);

        match self.state {
            SegmenterState::Idle => {
                if loud {
                    trace!("Speech started");
                    self.state = SegmenterState::Speech;
                    self.utterance.clear();
                    self.utterance.extend_from_slice(block);
                    self.silence = 0;
                }
                None
            },
            SegmenterState::Speech => {
                self.utterance.extend_from_slice(block);

                if loud {
                    self.silence = 0;
                }
                else {
                    self.silence += block.len();
                }

                if self.silence >= self.trailing_silence
                    || self.utterance.len() >= self.max_utterance
                {
                    self.finish()
                }
                else {
                    None
                }
            }
        }
    }

    fn finish(&mut self) -> Option<Vec<f32>> {
        let speech_len = self.utterance.len() - self.silence;
        let mut utterance = std::mem::take(&mut self.utterance);
        utterance.truncate(speech_len);

        self.state = SegmenterState::Idle;
        self.silence = 0;

        if utterance.len() < self.min_speech {
            trace!("Discarding {} samples of noise", utterance.len());
            return None
        }

        trace!("Utterance of {} samples", utterance.len());
        Some(utterance)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// RMS level of a block of samples.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

pub fn is_loud(block: &[f32], threshold: f32) -> bool {
    rms(block) > threshold
}

/// Remove quiet blocks from both ends of a recording.
pub fn trim(samples: &[f32], threshold: f32) -> &[f32] {
    let loud: Vec<usize> = samples
        .chunks(BLOCK_LEN)
        .enumerate()
        .filter(|(_, b)| is_loud(b, threshold))
        .map(|(i, _)| i)
        .collect();

    match (loud.first(), loud.last()) {
        (Some(&first), Some(&last)) => {
            let end = ((last + 1) * BLOCK_LEN).min(samples.len());
            &samples[first * BLOCK_LEN..end]
        },
        _ => &[]
    }
}

fn ms_to_samples(ms: u32) -> usize {
    (ms as usize * SAMPLE_RATE_HZ as usize) / 1000
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn tone(len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect()
    }

    fn recording() -> Vec<f32> {
        let mut r = vec![0.0; 1600];
        r.extend(tone(6400, 0.5));
        r.extend(vec![0.0; 8000]);
        r
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0.5, -0.5, 0.5, -0.5]), 0.5);
    }

    #[test]
    fn test_single_utterance_any_chunking() {
        for chunk in [1usize, 100, 480, 2000].iter() {
            let mut s = Segmenter::new(&DetectorParams::default());
            let mut found = Vec::new();

            for c in recording().chunks(*chunk) {
                found.extend(s.push(c));
            }

            assert_eq!(found.len(), 1, "chunk size {}", chunk);
            assert_eq!(found[0].len(), 6400);
            assert_eq!(s.state(), SegmenterState::Idle);
        }
    }

    #[test]
    fn test_short_noise_ignored() {
        let mut s = Segmenter::new(&DetectorParams::default());

        let mut r = tone(800, 0.5);
        r.extend(vec![0.0; 8000]);

        assert!(s.push(&r).is_empty());
        assert_eq!(s.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_quiet_ignored() {
        let mut s = Segmenter::new(&DetectorParams::default());

        assert!(s.push(&tone(16000, 0.01)).is_empty());
        assert_eq!(s.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_long_utterance_cut() {
        let mut s = Segmenter::new(&DetectorParams::default());

        let found = s.push(&tone(16000 * 4, 0.5));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 48000);
        assert_eq!(s.state(), SegmenterState::Speech);
    }

    #[test]
    fn test_trim() {
        let r = recording();
        let t = trim(&r, 0.02);

        assert_eq!(t.len(), 6400);
        assert!(trim(&vec![0.0; 1000], 0.02).is_empty());
    }
}
