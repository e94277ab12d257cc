//! Error types for the pitch tracker.
//!
//! Only contract violations are errors. A frame that carries no detectable
//! pitch is a normal outcome and is reported as
//! [`PitchEstimate::Unvoiced`](crate::PitchEstimate::Unvoiced).

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors reported when a session or detector is created, reconfigured or fed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    /// The analysis window is too short to hold a single candidate lag.
    #[error("invalid frame size {size}: at least {minimum} samples are required")]
    InvalidFrameSize { size: usize, minimum: usize },
    /// A frame handed to a session does not match the session's frame size.
    #[error("frame length mismatch: expected {expected} samples, got {actual}")]
    FrameLengthMismatch { expected: usize, actual: usize },
    /// The sample rate is zero or does not match the session.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(usize),
    /// The hop size is zero or larger than the frame.
    #[error("invalid hop size {hop}: must be between 1 and the frame size {frame}")]
    InvalidHopSize { hop: usize, frame: usize },
    /// The detectable frequency range is empty, non-finite or above Nyquist.
    #[error("invalid frequency range {min} Hz..{max} Hz")]
    InvalidFrequencyRange { min: f64, max: f64 },
    /// Continuity bias must be finite and non-negative.
    #[error("invalid continuity bias {0}: must be finite and >= 0")]
    InvalidBias(f64),
    /// Continuity tolerance must lie in `[0, 1]`.
    #[error("invalid continuity tolerance {0}: must be within [0, 1]")]
    InvalidTolerance(f64),
    /// Gate threshold must be finite and non-negative.
    #[error("invalid gate threshold {0}: must be finite and >= 0")]
    InvalidGateThreshold(f64),
    /// A sample block contained NaN or an infinity.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample { index: usize },
    /// Buffers for the session could not be reserved.
    #[error("failed to allocate {len} element buffer: {reason}")]
    AllocationFailed { len: usize, reason: String },
    /// The control side produced config updates faster than the audio side drains them.
    #[error("config queue is full; update dropped")]
    ConfigQueueFull,
    /// The session has been stopped and accepts no more samples.
    #[error("session stopped")]
    SessionStopped,
}

impl PitchError {
    pub(crate) fn allocation(len: usize, err: TryReserveError) -> Self {
        PitchError::AllocationFailed {
            len,
            reason: err.to_string(),
        }
    }
}

/// Result alias used across the public API.
pub type Result<T> = std::result::Result<T, PitchError>;
