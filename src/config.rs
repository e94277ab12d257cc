//! Session parameters.
//!
//! [`SessionSettings`] is fixed for the lifetime of a session and sizes every
//! buffer. [`Config`] may be replaced between frames; the tracker reads the
//! latest value at the start of every frame.

use crate::detector::internals::MIN_FRAME_SIZE;
use crate::error::{PitchError, Result};

pub const DEFAULT_FRAME_SIZE: usize = 2048;
pub const DEFAULT_SAMPLE_RATE: usize = 44100;
pub const DEFAULT_MIN_FREQUENCY: f64 = 50.0;
pub const DEFAULT_MAX_FREQUENCY: f64 = 2000.0;

pub const DEFAULT_BIAS: f64 = 0.5;
pub const DEFAULT_TOLERANCE: f64 = 0.15;
pub const DEFAULT_GATE_THRESHOLD: f64 = 0.01;

/// Which RMS value the noise gate compares against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateMode {
    /// Exponentially smoothed RMS. Rides over short dips between syllables.
    #[default]
    Smooth,
    /// RMS of the current frame only.
    Instant,
}

/// Pitch estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Probabilistic YIN with continuity bias.
    #[default]
    PYin,
    /// Classic YIN: first dip below an absolute threshold.
    Yin,
    /// McLeod pitch method (normalized square difference).
    McLeod,
}

/// Per-frame tunables, hot-swappable while a session runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Strength of the pull toward the previous pitch. `0` disables it.
    pub bias: f64,
    /// Relative period deviation, in `[0, 1]`, still counted as "the same note".
    pub tolerance: f64,
    /// RMS below which a frame is treated as silence. `0` disables the gate.
    pub gate_threshold: f64,
    pub gate_mode: GateMode,
    pub algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bias: DEFAULT_BIAS,
            tolerance: DEFAULT_TOLERANCE,
            gate_threshold: DEFAULT_GATE_THRESHOLD,
            gate_mode: GateMode::Smooth,
            algorithm: Algorithm::PYin,
        }
    }
}

impl Config {
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_gate_threshold(mut self, gate_threshold: f64) -> Self {
        self.gate_threshold = gate_threshold;
        self
    }

    pub fn with_gate_mode(mut self, gate_mode: GateMode) -> Self {
        self.gate_mode = gate_mode;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bias.is_finite() || self.bias < 0.0 {
            return Err(PitchError::InvalidBias(self.bias));
        }
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(PitchError::InvalidTolerance(self.tolerance));
        }
        if !self.gate_threshold.is_finite() || self.gate_threshold < 0.0 {
            return Err(PitchError::InvalidGateThreshold(self.gate_threshold));
        }
        Ok(())
    }
}

/// Parameters fixed when a session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Analysis window length in samples.
    pub frame_size: usize,
    /// Samples between the starts of consecutive windows.
    pub hop_size: usize,
    pub sample_rate: usize,
    /// Lowest reportable frequency in Hz (exclusive).
    pub min_frequency: f64,
    /// Highest reportable frequency in Hz (exclusive).
    pub max_frequency: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_FRAME_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_frequency: DEFAULT_MAX_FREQUENCY,
        }
    }
}

impl SessionSettings {
    /// Settings for `frame_size`-sample windows without overlap.
    pub fn new(frame_size: usize, sample_rate: usize) -> Self {
        SessionSettings {
            frame_size,
            hop_size: frame_size,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn with_hop_size(mut self, hop_size: usize) -> Self {
        self.hop_size = hop_size;
        self
    }

    pub fn with_frequency_range(mut self, min_frequency: f64, max_frequency: f64) -> Self {
        self.min_frequency = min_frequency;
        self.max_frequency = max_frequency;
        self
    }

    /// Duration of one hop in seconds; the deadline for processing one frame.
    pub fn hop_duration(&self) -> f64 {
        self.hop_size as f64 / self.sample_rate as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_size < MIN_FRAME_SIZE {
            return Err(PitchError::InvalidFrameSize {
                size: self.frame_size,
                minimum: MIN_FRAME_SIZE,
            });
        }
        if self.sample_rate == 0 {
            return Err(PitchError::InvalidSampleRate(self.sample_rate));
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(PitchError::InvalidHopSize {
                hop: self.hop_size,
                frame: self.frame_size,
            });
        }
        let nyquist = self.sample_rate as f64 / 2.0;
        let (min, max) = (self.min_frequency, self.max_frequency);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min >= max || max > nyquist {
            return Err(PitchError::InvalidFrequencyRange { min, max });
        }
        Ok(())
    }
}
