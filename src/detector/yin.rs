//! The YIN pitch detection algorithm is based on the algorithm from the paper
//! *[YIN, a fundamental frequency estimator for speech and music](http://recherche.ircam.fr/equipes/pcm/cheveign/ps/2002_JASA_YIN_proof.pdf)*.
//! It is efficient and offers an improvement over basic autocorrelation.
//!
//! Let $S=(s_0,s_1,\ldots,s_N)$ be a discrete signal. The *mean square difference function* at time $t$
//! is defined by
//! $$ d(t) = \sum_{i=0}^{N-t} (s_i-s_{i+t})^2. $$
//! This function is close to zero when the signal "lines up" with itself. However, *close* is a relative term,
//! and the value of $d\'(t)$ depends on volume, which should not affect the pitch of the signal. For this
//! reason, the signal is normalized. The YIN algorithm computes the *cumulative mean normalized difference function*,
//! $$ d\'(t) = \begin{cases}1&\text{if }t=0\\\\ d(t) / \left[ \tfrac{1}{t}\sum_{i=1}^t d(i) \right] & \text{otherwise}\end{cases}. $$
//! Then, it searches for the first local minimum of $d\'(t)$ below a given threshold.
//!
//! After a candidate frequency is found, quadratic interpolation is applied to further refine the estimate.
//!
//! This detector ignores the continuity prior. See [PYinDetector][crate::detector::pyin::PYinDetector]
//! for the variant that uses it.

use crate::detector::internals::{lag_window, square_difference, yin_normalize_square_error};
use crate::detector::internals::{DetectorInternals, Pitch};
use crate::detector::{ContinuityPrior, PitchDetector};
use crate::error::Result;
use crate::float::{from_f64, from_usize, Float};
use crate::utils::peak::parabolic_shift;

/// The YIN paper uses 0.1 as a threshold; TarsosDSP uses 0.2.
pub const DEFAULT_THRESHOLD: f64 = 0.15;

pub struct YINDetector<T>
where
    T: Float,
{
    internals: DetectorInternals<T>,
    threshold: T,
    min_frequency: f64,
    max_frequency: f64,
}

impl<T> YINDetector<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Result<Self> {
        let internals = DetectorInternals::new(1, 0, size, 0)?;
        Ok(YINDetector {
            internals,
            threshold: from_f64(DEFAULT_THRESHOLD),
            min_frequency: crate::config::DEFAULT_MIN_FREQUENCY,
            max_frequency: crate::config::DEFAULT_MAX_FREQUENCY,
        })
    }

    pub fn with_threshold(mut self, threshold: T) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_frequency_range(mut self, min_frequency: f64, max_frequency: f64) -> Self {
        self.min_frequency = min_frequency;
        self.max_frequency = max_frequency;
        self
    }
}

/// Pitch detection based on the YIN algorithm. See <http://recherche.ircam.fr/equipes/pcm/cheveign/ps/2002_JASA_YIN_proof.pdf>
impl<T> PitchDetector<T> for YINDetector<T>
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
        let half = self.internals.size / 2;
        let window = lag_window(sample_rate, self.min_frequency, self.max_frequency, half);
        let result = &mut self.internals.real_buffers[0][..window.limit];

        // STEP 2: Calculate the difference function, d_t.
        square_difference(signal, half, result);

        // STEP 3: Calculate the cumulative mean normalized difference function, d_t'.
        yin_normalize_square_error(result);

        // STEP 4: The absolute threshold. We want the first dip below `threshold`,
        // followed down to the bottom of its valley.
        let mut lag = window.search.clone().find(|&lag| result[lag] < self.threshold)?;
        while lag + 1 < window.search.end && result[lag + 1] < result[lag] {
            lag += 1;
        }

        // STEP 5: Use quadratic interpolation to fine-tune the result.
        let shift = parabolic_shift(result[lag - 1], result[lag], result[lag + 1]);
        let frequency = from_usize::<T>(sample_rate) / (from_usize::<T>(lag) + shift);
        let in_range = frequency > from_f64(self.min_frequency) && frequency < from_f64(self.max_frequency);
        if !frequency.is_finite() || !in_range {
            return None;
        }

        // A `clarity` is not given by the YIN algorithm. However, we can
        // say a pitch has higher clarity if it's YIN normalized square error is closer to zero.
        Some(Pitch {
            frequency,
            clarity: T::one() - result[lag],
        })

        // STEP 6: TODO. Step 6 of the YIN paper can eek out a little more accuracy/consistency, but
        // it also involves computing over a much larger window.
    }
}
