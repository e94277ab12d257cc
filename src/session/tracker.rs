//! Per-frame pipeline: gate, detector, history.

use crate::config::{Algorithm, Config, SessionSettings};
use crate::detector::internals::Pitch;
use crate::detector::mcleod::McLeodDetector;
use crate::detector::pyin::PYinDetector;
use crate::detector::yin::YINDetector;
use crate::detector::{ContinuityPrior, PitchDetector};
use crate::error::{PitchError, Result};
use crate::session::gate::GateState;
use crate::utils::buffer::first_non_finite;

/// Outcome of analysing one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchEstimate {
    Voiced(Pitch<f64>),
    /// Silence, noise, or no trustworthy periodicity.
    Unvoiced,
}

impl PitchEstimate {
    pub fn frequency(&self) -> Option<f64> {
        match self {
            PitchEstimate::Voiced(pitch) => Some(pitch.frequency),
            PitchEstimate::Unvoiced => None,
        }
    }

    pub fn is_voiced(&self) -> bool {
        matches!(self, PitchEstimate::Voiced(_))
    }
}

/// Last accepted pitch of a session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistoryState {
    pub last_frequency: Option<f64>,
}

impl HistoryState {
    pub fn clear(&mut self) {
        self.last_frequency = None;
    }
}

/// One analysis window borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub samples: &'a [f64],
    pub sample_rate: usize,
}

impl<'a> AudioFrame<'a> {
    pub fn new(samples: &'a [f64], sample_rate: usize) -> Self {
        AudioFrame {
            samples,
            sample_rate,
        }
    }
}

/// Every strategy a session can switch to, allocated up front so switching
/// between frames never allocates.
struct Detectors {
    pyin: PYinDetector<f64>,
    yin: YINDetector<f64>,
    mcleod: McLeodDetector<f64>,
}

impl Detectors {
    fn new(settings: &SessionSettings) -> Result<Self> {
        let (size, min, max) = (
            settings.frame_size,
            settings.min_frequency,
            settings.max_frequency,
        );
        Ok(Detectors {
            pyin: PYinDetector::new(size)?.with_frequency_range(min, max),
            yin: YINDetector::new(size)?.with_frequency_range(min, max),
            mcleod: McLeodDetector::new(size, size / 2)?.with_frequency_range(min, max),
        })
    }

    fn get(&mut self, algorithm: Algorithm) -> &mut dyn PitchDetector<f64> {
        match algorithm {
            Algorithm::PYin => &mut self.pyin,
            Algorithm::Yin => &mut self.yin,
            Algorithm::McLeod => &mut self.mcleod,
        }
    }
}

/// Owns the gate and history of one session and runs the pipeline on
/// complete frames.
pub struct Tracker {
    settings: SessionSettings,
    gate: GateState,
    history: HistoryState,
    detectors: Detectors,
}

impl Tracker {
    pub fn new(settings: SessionSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Tracker {
            settings,
            gate: GateState::default(),
            history: HistoryState::default(),
            detectors: Detectors::new(&settings)?,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn gate(&self) -> &GateState {
        &self.gate
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    /// The pYIN detector, for inspecting the last difference buffer.
    pub fn pyin(&self) -> &PYinDetector<f64> {
        &self.detectors.pyin
    }

    /// Run the pipeline on a frame from the caller, checking it first. A
    /// rejected frame leaves the gate and history untouched.
    pub fn analyze(&mut self, frame: AudioFrame<'_>, config: &Config) -> Result<PitchEstimate> {
        if frame.sample_rate != self.settings.sample_rate {
            return Err(PitchError::InvalidSampleRate(frame.sample_rate));
        }
        if frame.samples.len() != self.settings.frame_size {
            return Err(PitchError::FrameLengthMismatch {
                expected: self.settings.frame_size,
                actual: frame.samples.len(),
            });
        }
        if let Some(index) = first_non_finite(frame.samples) {
            return Err(PitchError::NonFiniteSample { index });
        }
        Ok(self.process(frame.samples, config))
    }

    /// Run the pipeline on a frame of exactly `frame_size` samples.
    pub(crate) fn process(&mut self, frame: &[f64], config: &Config) -> PitchEstimate {
        if !self
            .gate
            .evaluate(frame, config.gate_threshold, config.gate_mode)
        {
            self.history.clear();
            return PitchEstimate::Unvoiced;
        }

        let prior = ContinuityPrior {
            previous_frequency: self.history.last_frequency,
            bias: config.bias,
            tolerance: config.tolerance,
        };
        let detector = self.detectors.get(config.algorithm);
        match detector.get_pitch(frame, self.settings.sample_rate, &prior) {
            Some(pitch) => {
                self.history.last_frequency = Some(pitch.frequency);
                PitchEstimate::Voiced(pitch)
            }
            None => {
                self.history.clear();
                PitchEstimate::Unvoiced
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateMode;

    fn sine(freq: f64, settings: &SessionSettings, amplitude: f64) -> Vec<f64> {
        (0..settings.frame_size)
            .map(|i| {
                amplitude
                    * (2.0 * std::f64::consts::PI * freq * i as f64 / settings.sample_rate as f64)
                        .sin()
            })
            .collect()
    }

    fn instant_gate() -> Config {
        Config::default()
            .with_gate_mode(GateMode::Instant)
            .with_gate_threshold(0.05)
    }

    #[test]
    fn voiced_frame_sets_history() {
        let settings = SessionSettings::default();
        let mut tracker = Tracker::new(settings).unwrap();
        let estimate = tracker.process(&sine(220.0, &settings, 0.5), &instant_gate());
        assert!(estimate.is_voiced());
        assert_eq!(tracker.history().last_frequency, estimate.frequency());
    }

    #[test]
    fn closed_gate_clears_history() {
        let settings = SessionSettings::default();
        let mut tracker = Tracker::new(settings).unwrap();
        tracker.process(&sine(220.0, &settings, 0.5), &instant_gate());
        assert!(tracker.history().last_frequency.is_some());

        let quiet = sine(220.0, &settings, 0.01);
        assert_eq!(tracker.process(&quiet, &instant_gate()), PitchEstimate::Unvoiced);
        assert_eq!(tracker.history().last_frequency, None);
        assert!(!tracker.gate().is_open);
    }

    #[test]
    fn analyze_rejects_malformed_frames() {
        let settings = SessionSettings::default();
        let mut tracker = Tracker::new(settings).unwrap();
        let short = vec![0.0; 100];
        assert_eq!(
            tracker.analyze(AudioFrame::new(&short, 44100), &Config::default()),
            Err(PitchError::FrameLengthMismatch {
                expected: 2048,
                actual: 100
            })
        );
        let frame = vec![0.0; 2048];
        assert_eq!(
            tracker.analyze(AudioFrame::new(&frame, 48000), &Config::default()),
            Err(PitchError::InvalidSampleRate(48000))
        );
    }

    #[test]
    fn analyze_rejects_non_finite_frames() {
        let settings = SessionSettings::default();
        let mut tracker = Tracker::new(settings).unwrap();
        let config = Config::default();
        let clean = sine(220.0, &settings, 0.5);
        tracker.process(&clean, &config);
        let gate = *tracker.gate();

        let mut bad = clean.clone();
        bad[10] = f64::NAN;
        assert_eq!(
            tracker.analyze(AudioFrame::new(&bad, 44100), &config),
            Err(PitchError::NonFiniteSample { index: 10 })
        );
        assert_eq!(*tracker.gate(), gate);
        assert!(tracker.gate().smoothed_rms.is_finite());
    }

    #[test]
    fn every_algorithm_finds_a_clean_tone() {
        let settings = SessionSettings::default();
        let mut tracker = Tracker::new(settings).unwrap();
        let frame = sine(330.0, &settings, 0.5);
        for algorithm in [Algorithm::PYin, Algorithm::Yin, Algorithm::McLeod] {
            let config = instant_gate().with_algorithm(algorithm);
            let frequency = tracker.process(&frame, &config).frequency().unwrap();
            assert!((frequency - 330.0).abs() < 2.0, "{:?}: {}", algorithm, frequency);
        }
    }
}
