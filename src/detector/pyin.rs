//! Probabilistic YIN with a continuity prior, tuned for singing voice.
//!
//! Classic [YIN][crate::detector::yin] commits to the first dip of the
//! cumulative mean normalized difference function (CMNDF) that falls below an
//! absolute threshold. This detector instead collects *every* valley of the
//! CMNDF below 1 and scores them, which lets the previously accepted pitch
//! take part in the decision:
//!
//! 1. Every valley at lag $\tau$ with CMNDF value $e$ gets a base probability
//!    $(1-e)^4$, so only deep valleys score well.
//! 2. If a previous pitch exists and the bias $b$ is positive, let
//!    $r = |\tau - \tau_{prev}| / \tau_{prev}$. Valleys with $r$ below the
//!    tolerance are multiplied by $1 + g b$ (with continuity gain $g$,
//!    default 2). Valleys with $r \approx 0.5$ are the classic octave error
//!    and are halved.
//! 3. The best score wins unless it is below 0.01. Valleys are visited in
//!    increasing lag order and a longer lag only replaces the current best
//!    if it beats it by a relative margin (default 5%); a pure tone has a
//!    near-perfect valley at every multiple of its period and the shortest
//!    one is the pitch.
//! 4. The winning lag is refined by parabolic interpolation.
//!
//! The difference function is computed directly in the time domain. For a
//! constant input every difference is exactly zero and the CMNDF collapses to
//! 1 everywhere, so silence-like frames yield no candidates instead of NaNs.

use crate::detector::internals::{lag_window, square_difference, yin_normalize_square_error};
use crate::detector::internals::{DetectorInternals, Pitch};
use crate::detector::{ContinuityPrior, PitchDetector};
use crate::error::{PitchError, Result};
use crate::float::{abs, from_f64, from_usize, Float};
use crate::utils::peak::{detect_valleys, parabolic_shift, Candidate};

/// Scores below this are not trusted.
pub const CONFIDENCE_FLOOR: f64 = 0.01;
pub const DEFAULT_CONTINUITY_GAIN: f64 = 2.0;
pub const DEFAULT_SUBHARMONIC_MARGIN: f64 = 0.05;

const OCTAVE_RATIO: f64 = 0.5;
const OCTAVE_WINDOW: f64 = 0.05;
const OCTAVE_PENALTY: f64 = 0.5;

pub struct PYinDetector<T>
where
    T: Float,
{
    internals: DetectorInternals<T>,
    candidates: Vec<Candidate<T>>,
    limit: usize,
    min_frequency: f64,
    max_frequency: f64,
    continuity_gain: T,
    subharmonic_margin: T,
}

impl<T> PYinDetector<T>
where
    T: Float,
{
    /// A detector for frames of exactly `size` samples.
    pub fn new(size: usize) -> Result<Self> {
        let internals = DetectorInternals::new(1, 0, size, 0)?;
        let half = size / 2;
        let mut candidates = Vec::new();
        candidates
            .try_reserve_exact(half)
            .map_err(|e| PitchError::allocation(half, e))?;

        Ok(PYinDetector {
            internals,
            candidates,
            limit: 0,
            min_frequency: crate::config::DEFAULT_MIN_FREQUENCY,
            max_frequency: crate::config::DEFAULT_MAX_FREQUENCY,
            continuity_gain: from_f64(DEFAULT_CONTINUITY_GAIN),
            subharmonic_margin: from_f64(DEFAULT_SUBHARMONIC_MARGIN),
        })
    }

    /// Only report frequencies strictly inside `min_frequency..max_frequency`.
    pub fn with_frequency_range(mut self, min_frequency: f64, max_frequency: f64) -> Self {
        self.min_frequency = min_frequency;
        self.max_frequency = max_frequency;
        self
    }

    /// Multiplier applied to the bias for continuity-consistent valleys.
    pub fn with_continuity_gain(mut self, gain: T) -> Self {
        self.continuity_gain = gain;
        self
    }

    /// Relative margin a longer lag needs to displace a shorter one. Zero
    /// gives a plain first-wins argmax.
    pub fn with_subharmonic_margin(mut self, margin: T) -> Self {
        self.subharmonic_margin = margin;
        self
    }

    /// CMNDF of the last analysed frame.
    pub fn cmndf(&self) -> &[T] {
        &self.internals.real_buffers[0][..self.limit]
    }

    /// Valleys found in the last analysed frame, in increasing lag order.
    pub fn candidates(&self) -> &[Candidate<T>] {
        &self.candidates
    }
}

/// Multiplier the continuity prior applies to a valley at `lag`.
pub fn continuity_weight<T>(lag: T, sample_rate: T, prior: &ContinuityPrior<T>, gain: T) -> T
where
    T: Float,
{
    let previous = match prior.previous_frequency {
        Some(previous) if prior.bias > T::zero() && previous > T::zero() => previous,
        _ => return T::one(),
    };
    let previous_lag = sample_rate / previous;
    let ratio = abs(lag - previous_lag) / previous_lag;

    if ratio < prior.tolerance {
        T::one() + prior.bias * gain
    } else if abs(ratio - from_f64(OCTAVE_RATIO)) < from_f64(OCTAVE_WINDOW) {
        from_f64(OCTAVE_PENALTY)
    } else {
        T::one()
    }
}

/// Probability score of one valley under `prior`.
pub fn score_candidate<T>(
    candidate: &Candidate<T>,
    sample_rate: T,
    prior: &ContinuityPrior<T>,
    gain: T,
) -> T
where
    T: Float,
{
    let base = (T::one() - candidate.error).powi(4);
    base * continuity_weight(from_usize(candidate.lag), sample_rate, prior, gain)
}

/// Pick the winning valley and its score, or `None` when no valley reaches
/// [CONFIDENCE_FLOOR]. `candidates` must be in increasing lag order.
pub fn select_candidate<T>(
    candidates: &[Candidate<T>],
    sample_rate: T,
    prior: &ContinuityPrior<T>,
    gain: T,
    margin: T,
) -> Option<(Candidate<T>, T)>
where
    T: Float,
{
    let replace_factor = T::one() + margin;
    let best = candidates.iter().fold(None, |best, candidate| {
        let score = score_candidate(candidate, sample_rate, prior, gain);
        match best {
            Some((kept, kept_score)) if score <= kept_score * replace_factor => {
                Some((kept, kept_score))
            }
            _ => Some((*candidate, score)),
        }
    });
    best.filter(|(_, score)| *score >= from_f64(CONFIDENCE_FLOOR))
}

impl<T> PitchDetector<T> for PYinDetector<T>
where
    T: Float,
{
    fn get_pitch(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        prior: &ContinuityPrior<T>,
    ) -> Option<Pitch<T>> {
        assert_eq!(signal.len(), self.internals.size);
        let half = self.internals.size / 2;
        let window = lag_window(sample_rate, self.min_frequency, self.max_frequency, half);

        self.limit = window.limit;
        self.candidates.clear();
        let cmndf = &mut self.internals.real_buffers[0][..window.limit];

        // Difference function and its cumulative mean normalization.
        square_difference(signal, half, cmndf);
        yin_normalize_square_error(cmndf);

        self.candidates
            .extend(detect_valleys(cmndf, window.search.clone()));

        let sample_rate_t: T = from_usize(sample_rate);
        let (best, _) = select_candidate(
            &self.candidates,
            sample_rate_t,
            prior,
            self.continuity_gain,
            self.subharmonic_margin,
        )?;

        let lag = best.lag;
        if lag == 0 || lag + 1 >= cmndf.len() {
            return None;
        }
        let shift = parabolic_shift(cmndf[lag - 1], cmndf[lag], cmndf[lag + 1]);
        let frequency = sample_rate_t / (from_usize::<T>(lag) + shift);

        let in_range = frequency > from_f64(self.min_frequency) && frequency < from_f64(self.max_frequency);
        if !frequency.is_finite() || !in_range {
            return None;
        }
        Some(Pitch {
            frequency,
            clarity: T::one() - best.error,
        })
    }
}
