//! Hotword detector
//!
//! Each hotword is described by a template, a WAV recording of it being spoken. Incoming audio is
//! split into utterances by the [`Segmenter`], and each utterance is compared against every
//! template with dynamic time warping over log band energies. An utterance matches the closest
//! template if its score, `1 / (1 + distance)`, reaches the sensitivity.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod dtw;
mod features;
mod segmenter;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::params::DetectorParams;
use eqpt_if::eqpt::audio::SAMPLE_RATE_HZ;

pub use dtw::dtw_distance;
pub use features::{FeatureExtractor, Frame, FRAME_HOP, FRAME_LEN, NUM_BANDS};
pub use segmenter::{rms, trim, Segmenter, SegmenterState, BLOCK_LEN};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A reference recording of one hotword.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    features: Vec<Frame>,
}

pub struct HotwordDetector {
    templates: Vec<Template>,
    sensitivity: f32,
    audio_gain: f32,
    segmenter: Segmenter,
    extractor: FeatureExtractor,
}

/// The result of comparing an utterance with the templates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    /// Index of the closest template
    pub index: usize,

    /// Score of the closest template, between 0 and 1
    pub score: f32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Could not read the template {0:?}: {1}")]
    Wav(PathBuf, hound::Error),

    #[error("Template {0:?} is not usable: {1}")]
    UnsupportedWav(PathBuf, String),

    #[error("Template {0:?} contains no speech")]
    EmptyTemplate(String),

    #[error("At least one template is required")]
    NoTemplates,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Template {
    /// Build a template from raw samples at the capture rate.
    ///
    /// Quiet sections at either end are trimmed off before the features are taken.
    pub fn from_samples(
        name: &str,
        samples: &[f32],
        params: &DetectorParams,
        extractor: &FeatureExtractor,
    ) -> Result<Self, DetectorError> {
        let features = extractor.extract(trim(samples, params.energy_threshold));

        if features.is_empty() {
            return Err(DetectorError::EmptyTemplate(name.to_string()))
        }

        Ok(Self {
            name: name.to_string(),
            features,
        })
    }

    /// Load a template from a mono WAV file recorded at 16 kHz.
    ///
    /// 8, 16, 24 and 32 bit integer and 32 bit float samples are accepted.
    pub fn from_wav<P: AsRef<Path>>(
        path: P,
        params: &DetectorParams,
        extractor: &FeatureExtractor,
    ) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let bad = |msg: String| DetectorError::UnsupportedWav(path.to_path_buf(), msg);

        let mut reader = hound::WavReader::open(path)
            .map_err(|e| DetectorError::Wav(path.to_path_buf(), e))?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(bad(format!("{} channels, expected 1", spec.channels)))
        }
        if spec.sample_rate != SAMPLE_RATE_HZ {
            return Err(bad(format!(
                "sampled at {} Hz, expected {} Hz",
                spec.sample_rate, SAMPLE_RATE_HZ
            )))
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| DetectorError::Wav(path.to_path_buf(), e))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| DetectorError::Wav(path.to_path_buf(), e))?
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let template = Self::from_samples(&name, &samples, params, extractor)?;
        debug!("Loaded template {} with {} frames", name, template.features.len());

        Ok(template)
    }

    /// Number of feature frames in the template.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl HotwordDetector {
    /// Build a detector from the templates, in detection index order.
    pub fn new(
        templates: Vec<Template>,
        sensitivity: f32,
        audio_gain: f32,
        params: &DetectorParams,
    ) -> Result<Self, DetectorError> {
        if templates.is_empty() {
            return Err(DetectorError::NoTemplates)
        }

        info!(
            "Hotword detector with {} templates, sensitivity {}, gain {}",
            templates.len(), sensitivity, audio_gain
        );

        Ok(Self {
            templates,
            sensitivity,
            audio_gain,
            segmenter: Segmenter::new(params),
            extractor: FeatureExtractor::new(),
        })
    }

    /// Load every template from WAV files and build a detector.
    pub fn from_wavs<P: AsRef<Path>>(
        paths: &[P],
        sensitivity: f32,
        audio_gain: f32,
        params: &DetectorParams,
    ) -> Result<Self, DetectorError> {
        let extractor = FeatureExtractor::new();

        let templates = paths
            .iter()
            .map(|p| Template::from_wav(p, params, &extractor))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(templates, sensitivity, audio_gain, params)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Feed raw audio in, returning the index of a detected hotword.
    ///
    /// Each utterance gives at most one detection.
    pub fn process(&mut self, samples: &[f32]) -> Option<usize> {
        let gain = self.audio_gain;
        let amplified: Vec<f32> = samples
            .iter()
            .map(|s| (s * gain).max(-1.0).min(1.0))
            .collect();

        let mut detected = None;

        for utterance in self.segmenter.push(&amplified) {
            let scored = match self.score(&utterance) {
                Some(s) => s,
                None => continue
            };

            let name = &self.templates[scored.index].name;

            if scored.score < self.sensitivity {
                debug!("Closest hotword {} scored {:.3}, rejected", name, scored.score);
                continue
            }

            info!("Hotword {} detected (score {:.3})", name, scored.score);

            if detected.is_some() {
                warn!("More than one hotword completed at once, dropping {}", name);
            }
            else {
                detected = Some(scored.index);
            }
        }

        detected
    }

    /// Score an utterance against the templates, returning the closest.
    pub fn score(&self, utterance: &[f32]) -> Option<Scored> {
        let features = self.extractor.extract(utterance);

        self.templates
            .iter()
            .enumerate()
            .map(|(index, t)| Scored {
                index,
                score: 1.0 / (1.0 + dtw_distance(&features, &t.features)),
            })
            .filter(|s| s.score > 0.0)
            .fold(None, |best: Option<Scored>, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ => Some(s)
            })
    }

    /// Drop any partial utterance.
    pub fn reset(&mut self) {
        self.segmenter.reset();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

/// Synthetic "hotwords" for tests: a short chirp between two frequencies with silence around it.
#[cfg(test)]
pub(crate) fn test_utterance(f0: f32, f1: f32) -> Vec<f32> {
    let len = 6400;
    let mut phase = 0.0f32;
    let mut samples = vec![0.0; 1600];

    for i in 0..len {
        let freq = f0 + (f1 - f0) * i as f32 / len as f32;
        phase += 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE_HZ as f32;
        samples.push(0.4 * phase.sin());
    }

    samples.extend(vec![0.0; 8000]);
    samples
}

/// Frequencies of the four test hotwords.
#[cfg(test)]
pub(crate) const TEST_WORDS: [(f32, f32); 4] = [
    (300.0, 600.0),
    (2500.0, 1200.0),
    (700.0, 3500.0),
    (3800.0, 3000.0),
];

#[cfg(test)]
pub(crate) fn test_detector() -> HotwordDetector {
    let params = DetectorParams::default();
    let fe = FeatureExtractor::new();

    let templates = TEST_WORDS
        .iter()
        .enumerate()
        .map(|(i, (f0, f1))| {
            Template::from_samples(&format!("word_{}", i), &test_utterance(*f0, *f1), &params, &fe)
                .unwrap()
        })
        .collect();

    HotwordDetector::new(templates, 0.5, 1.75, &params).unwrap()
}

#[cfg(test)]
mod test {
    use super::*;

    fn feed(d: &mut HotwordDetector, samples: &[f32]) -> Vec<usize> {
        samples.chunks(480).filter_map(|c| d.process(c)).collect()
    }

    #[test]
    fn test_each_word_detected_once() {
        let mut d = test_detector();

        for (i, (f0, f1)) in TEST_WORDS.iter().enumerate() {
            assert_eq!(feed(&mut d, &test_utterance(*f0, *f1)), vec![i]);
        }
    }

    #[test]
    fn test_unknown_word_rejected() {
        let mut d = test_detector();

        // Below the range of every template
        let other = test_utterance(150.0, 180.0);
        assert!(feed(&mut d, &other).is_empty());
    }

    #[test]
    fn test_quiet_ignored() {
        let mut d = test_detector();

        let quiet: Vec<f32> = test_utterance(300.0, 600.0).iter().map(|s| s * 0.01).collect();
        assert!(feed(&mut d, &quiet).is_empty());
    }

    #[test]
    fn test_score() {
        let d = test_detector();
        let u = test_utterance(700.0, 3500.0);

        let s = d.score(trim(&u, 0.02)).unwrap();
        assert_eq!(s.index, 2);
        assert!(s.score > 0.99);
    }

    #[test]
    fn test_no_templates() {
        assert!(matches!(
            HotwordDetector::new(vec![], 0.5, 1.0, &DetectorParams::default()),
            Err(DetectorError::NoTemplates)
        ));
    }

    #[test]
    fn test_wav_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rob_press_a.wav");
        let params = DetectorParams::default();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE_HZ,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in test_utterance(300.0, 600.0) {
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let fe = FeatureExtractor::new();
        let t = Template::from_wav(&path, &params, &fe).unwrap();
        assert_eq!(t.name, "rob_press_a");
        assert_eq!(t.len(), 38);

        // The file template matches the same word from the detector's own templates
        let mut d = HotwordDetector::from_wavs(&[&path], 0.5, 1.75, &params).unwrap();
        let found: Vec<usize> = test_utterance(300.0, 600.0)
            .chunks(480)
            .filter_map(|c| d.process(c))
            .collect();
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn test_wav_wrong_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(
            Template::from_wav(&path, &DetectorParams::default(), &FeatureExtractor::new()),
            Err(DetectorError::UnsupportedWav(_, _))
        ));
    }
}
