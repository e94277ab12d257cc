use std::ops::Range;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{PitchError, Result};
use crate::float::{from_f64, from_usize, Float};
use crate::utils::buffer::{copy_complex_to_real, copy_real_to_complex, modulus_squared};
use crate::utils::buffer::{new_complex_buffer, new_real_buffer, square_sum, ComplexComponent};
use crate::utils::peak::{choose_peak, correct_peak, detect_peaks, PeakCorrection};

/// Smallest analysis window that still leaves a searchable lag.
pub const MIN_FRAME_SIZE: usize = 8;

/// A detected pitch: frequency in Hz and a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch<T>
where
    T: Float,
{
    pub frequency: T,
    pub clarity: T,
}

/// Data structure to hold any buffers needed for pitch computation.
/// Buffers are allocated once, when the detector is created, so the
/// per-frame path never allocates.
pub struct DetectorInternals<T>
where
    T: Float,
{
    pub size: usize,
    pub padding: usize,
    pub real_buffers: Vec<Vec<T>>,
    pub complex_buffers: Vec<Vec<Complex<T>>>,
}

impl<T> DetectorInternals<T>
where
    T: Float,
{
    pub fn new(n_real_buffers: usize, n_complex_buffers: usize, size: usize, padding: usize) -> Result<Self> {
        if size < MIN_FRAME_SIZE {
            return Err(PitchError::InvalidFrameSize {
                size,
                minimum: MIN_FRAME_SIZE,
            });
        }
        let buffer_size = size + padding;
        let real_buffers = (0..n_real_buffers)
            .map(|_| new_real_buffer(buffer_size))
            .collect::<Result<Vec<_>>>()?;
        let complex_buffers = (0..n_complex_buffers)
            .map(|_| new_complex_buffer(buffer_size))
            .collect::<Result<Vec<_>>>()?;

        Ok(DetectorInternals {
            size,
            padding,
            real_buffers,
            complex_buffers,
        })
    }

    pub fn has_sufficient_buffers(&self, n_real_buffers: usize, n_complex_buffers: usize) -> bool {
        self.real_buffers.len() >= n_real_buffers && self.complex_buffers.len() >= n_complex_buffers
    }
}

/// Lags examined for one analysis window. The difference function is
/// evaluated on `0..limit` and valleys are searched in `search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagWindow {
    pub search: Range<usize>,
    pub limit: usize,
}

/// Translate a frequency range into lags for a window whose difference
/// function spans `half` lags. The shortest searched lag is 2 and the search
/// always leaves one lag of headroom on the right for interpolation.
pub fn lag_window(sample_rate: usize, min_frequency: f64, max_frequency: f64, half: usize) -> LagWindow {
    let sample_rate = sample_rate as f64;
    let max_lag = (sample_rate / min_frequency).ceil() as usize;
    let min_lag = (sample_rate / max_frequency).floor() as usize;
    let limit = half.min(max_lag.saturating_add(2));
    LagWindow {
        search: min_lag.max(2)..limit.saturating_sub(1),
        limit,
    }
}

/// Compute the windowed square error, _d(t)_, of `signal` for every lag
/// `t` in `0..result.len()`. For a window size of _w_ and a signal
/// _x=(x_0,x_1,...)_, this is defined by
///
///  > d(t) = sum_{i=0}^{w-1} (x_i - x_{i+t})^2
///
/// The sum is evaluated directly in the time domain, so a constant signal
/// produces exact zeros.
pub fn square_difference<T>(signal: &[T], window_size: usize, result: &mut [T])
where
    T: Float,
{
    assert!(
        window_size + result.len() <= signal.len() + 1,
        "The lag range runs past the end of the signal"
    );

    let window = &signal[..window_size];
    result.iter_mut().enumerate().for_each(|(lag, d)| {
        *d = window
            .iter()
            .zip(&signal[lag..lag + window_size])
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum();
    });
}

/// Calculate the "cumulative mean normalized difference function" as
/// specified in the YIN paper. If _d(t)_ is the square error function,
/// compute _d'(0) = 1_ and for _t > 0_
///
///  > d'(t) = d(t) / [ (1/t) * sum_{i=1}^t d(i) ]
///
/// While the running sum is still zero (a signal identical to itself at
/// every lag so far) the value is pinned to 1.
pub fn yin_normalize_square_error<T: Float>(square_error: &mut [T]) {
    if square_error.is_empty() {
        return;
    }
    let mut sum = T::zero();
    square_error[0] = T::one();
    square_error
        .iter_mut()
        .enumerate()
        .skip(1)
        .for_each(|(lag, a)| {
            sum = sum + *a;
            *a = if sum.is_zero() {
                T::one()
            } else {
                *a * from_usize::<T>(lag) / sum
            };
        });
}

/// Forward and inverse FFT plans for a fixed length, created once per detector.
pub struct FftPair<T: Float> {
    forward: Arc<dyn Fft<T>>,
    inverse: Arc<dyn Fft<T>>,
}

impl<T: Float> FftPair<T> {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        FftPair {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scratch length needed by [autocorrelation].
    pub fn scratch_len(&self) -> usize {
        self.forward
            .get_inplace_scratch_len()
            .max(self.inverse.get_inplace_scratch_len())
            .max(1)
    }
}

/// Compute the autocorrelation of `signal` to `result`. `signal_complex` must
/// have the length of the plans; `signal` is zero padded into it.
pub fn autocorrelation<T>(
    signal: &[T],
    fft: &FftPair<T>,
    signal_complex: &mut [Complex<T>],
    scratch: &mut [Complex<T>],
    result: &mut [T],
) where
    T: Float,
{
    let signal_complex = &mut signal_complex[..fft.len()];
    copy_real_to_complex(signal, signal_complex, ComplexComponent::Re);
    fft.forward.process_with_scratch(signal_complex, scratch);
    modulus_squared(signal_complex);
    fft.inverse.process_with_scratch(signal_complex, scratch);
    // rustfft leaves the forward/inverse pair scaled by the transform length.
    let normalization = T::one() / from_usize(fft.len());
    signal_complex.iter_mut().for_each(|c| *c = *c * normalization);
    let valid = signal_complex.len().min(result.len());
    copy_complex_to_real(&signal_complex[..valid], result, ComplexComponent::Re);
}

/// McLeod's _m'(t) = sum_{i=0}^{N-1-t} (x_i^2 + x_{i+t}^2)_, padded with the
/// last value past the end of `signal`.
fn m_of_tau<T>(signal: &[T], result: &mut [T])
where
    T: Float,
{
    let n = signal.len();
    let mut m = from_f64::<T>(2.0) * square_sum(signal);
    for (tau, r) in result.iter_mut().enumerate() {
        if tau > 0 && tau <= n {
            m = m - signal[tau - 1] * signal[tau - 1] - signal[n - tau] * signal[n - tau];
        }
        *r = m;
    }
}

/// Normalized square difference function of `signal`, written to `result`.
/// Lags where _m'(t)_ vanishes are reported as 0.
pub fn normalized_square_difference<T>(
    signal: &[T],
    fft: &FftPair<T>,
    signal_complex: &mut [Complex<T>],
    scratch: &mut [Complex<T>],
    m_buffer: &mut [T],
    result: &mut [T],
) where
    T: Float,
{
    let two = from_f64::<T>(2.0);

    autocorrelation(signal, fft, signal_complex, scratch, result);
    m_of_tau(signal, m_buffer);
    result.iter_mut().zip(m_buffer.iter()).for_each(|(r, &m)| {
        *r = if m > T::epsilon() { two * *r / m } else { T::zero() };
    })
}

pub fn pitch_from_peaks<T>(
    input: &[T],
    sample_rate: usize,
    clarity_threshold: T,
    correction: PeakCorrection,
) -> Option<Pitch<T>>
where
    T: Float,
{
    if input.is_empty() || input[0].is_zero() {
        return None;
    }
    let sample_rate: T = from_usize(sample_rate);
    let peaks = detect_peaks(input);

    choose_peak(peaks, clarity_threshold)
        .map(|peak| correct_peak(peak, input, correction))
        .filter(|peak| peak.0 > T::zero())
        .map(|peak| Pitch {
            frequency: sample_rate / peak.0,
            clarity: peak.1 / input[0],
        })
}
