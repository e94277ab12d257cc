//! The McLeod pitch method: peaks of the normalized square difference
//! function (NSDF), computed with an FFT over a zero-padded window. The FFT
//! plans and scratch space are created with the detector.

use rustfft::num_complex::Complex;

use crate::detector::internals::{normalized_square_difference, pitch_from_peaks};
use crate::detector::internals::{DetectorInternals, FftPair, Pitch};
use crate::detector::{ContinuityPrior, PitchDetector};
use crate::error::Result;
use crate::float::{from_f64, Float};
use crate::utils::buffer::new_complex_buffer;
use crate::utils::peak::PeakCorrection;

pub const DEFAULT_CLARITY_THRESHOLD: f64 = 0.7;

pub struct McLeodDetector<T>
where
    T: Float,
{
    internals: DetectorInternals<T>,
    fft: FftPair<T>,
    scratch: Vec<Complex<T>>,
    clarity_threshold: T,
    min_frequency: f64,
    max_frequency: f64,
}

impl<T> McLeodDetector<T>
where
    T: Float,
{
    /// `padding` zeros are appended before the FFT; `size / 2` keeps the
    /// correlation linear over the lags that matter.
    pub fn new(size: usize, padding: usize) -> Result<Self> {
        let internals = DetectorInternals::new(2, 1, size, padding)?;
        let fft = FftPair::new(size + padding);
        let scratch = new_complex_buffer(fft.scratch_len())?;
        Ok(McLeodDetector {
            internals,
            fft,
            scratch,
            clarity_threshold: from_f64(DEFAULT_CLARITY_THRESHOLD),
            min_frequency: crate::config::DEFAULT_MIN_FREQUENCY,
            max_frequency: crate::config::DEFAULT_MAX_FREQUENCY,
        })
    }

    pub fn with_clarity_threshold(mut self, clarity_threshold: T) -> Self {
        self.clarity_threshold = clarity_threshold;
        self
    }

    pub fn with_frequency_range(mut self, min_frequency: f64, max_frequency: f64) -> Self {
        self.min_frequency = min_frequency;
        self.max_frequency = max_frequency;
        self
    }
}

impl<T> PitchDetector<T> for McLeodDetector<T>
where
    T: Float,
{
    fn get_pitch(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        _prior: &ContinuityPrior<T>,
    ) -> Option<Pitch<T>> {
        assert_eq!(signal.len(), self.internals.size);
        // We need two real buffers and one complex buffer for scratch.
        assert!(self.internals.has_sufficient_buffers(2, 1));

        let (m_buffer, nsdf) = split_first_two_mut(&mut self.internals.real_buffers);
        let signal_complex = &mut self.internals.complex_buffers[0];
        let nsdf = &mut nsdf[..signal.len()];

        normalized_square_difference(
            signal,
            &self.fft,
            signal_complex,
            &mut self.scratch,
            m_buffer,
            nsdf,
        );

        pitch_from_peaks(
            nsdf,
            sample_rate,
            self.clarity_threshold,
            PeakCorrection::Quadratic,
        )
        .filter(|pitch| {
            pitch.frequency > from_f64(self.min_frequency)
                && pitch.frequency < from_f64(self.max_frequency)
        })
    }
}

/// Split the first two elements from `array` off as mutable elements in a tuple.
fn split_first_two_mut<T>(array: &mut [T]) -> (&mut T, &mut T) {
    let (first, rest) = array.split_at_mut(1);
    (&mut first[0], &mut rest[0])
}
