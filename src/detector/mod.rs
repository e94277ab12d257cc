use crate::detector::internals::Pitch;
use crate::float::Float;

pub mod internals;
pub mod mcleod;
pub mod pyin;
pub mod yin;

/// What a detector may know about the frames before the current one.
///
/// Detectors never hold on to this themselves; the caller owns the history
/// and decides when it is cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuityPrior<T>
where
    T: Float,
{
    /// Frequency accepted on the previous voiced frame, if any.
    pub previous_frequency: Option<T>,
    /// Strength of the pull toward `previous_frequency`.
    pub bias: T,
    /// Relative period deviation counted as continuing the previous pitch.
    pub tolerance: T,
}

impl<T> ContinuityPrior<T>
where
    T: Float,
{
    /// A prior that carries no history.
    pub fn none() -> Self {
        ContinuityPrior {
            previous_frequency: None,
            bias: T::zero(),
            tolerance: T::zero(),
        }
    }
}

pub trait PitchDetector<T>
where
    T: Float,
{
    /// Estimate the pitch of `signal`. `None` means the frame carries no
    /// usable periodicity; that is a normal result, not an error.
    fn get_pitch(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        prior: &ContinuityPrior<T>,
    ) -> Option<Pitch<T>>;
}
