//! Detection sessions.
//!
//! A [`PitchSession`] is the single-threaded form: the caller pushes sample
//! blocks and polls for the latest estimate on the same thread. For an audio
//! callback on its own thread, [`realtime::start`] splits a session into a
//! control half and an audio half.

pub mod accumulator;
pub mod gate;
pub mod realtime;
pub mod tracker;

use log::debug;

use crate::config::{Config, SessionSettings};
use crate::error::{PitchError, Result};
use crate::session::accumulator::FrameAccumulator;
use crate::session::gate::GateState;
use crate::session::tracker::{AudioFrame, HistoryState, PitchEstimate, Tracker};
use crate::utils::buffer::first_non_finite;

/// An active detection session. Created by [`PitchSession::start`] and ended
/// by [`PitchSession::stop`], which consumes it and frees every buffer.
pub struct PitchSession {
    config: Config,
    accumulator: FrameAccumulator,
    tracker: Tracker,
    latest: Option<PitchEstimate>,
    frames: u64,
}

impl PitchSession {
    /// Validate `settings` and `config` and allocate all session buffers.
    pub fn start(settings: SessionSettings, config: Config) -> Result<Self> {
        config.validate()?;
        let tracker = Tracker::new(settings)?;
        let accumulator = FrameAccumulator::new(settings.frame_size, settings.hop_size)?;
        debug!(
            "pitch session started: {} samples/frame, hop {}, {} Hz, {:?}",
            settings.frame_size, settings.hop_size, settings.sample_rate, config.algorithm
        );
        Ok(PitchSession {
            config,
            accumulator,
            tracker,
            latest: None,
            frames: 0,
        })
    }

    /// Replace the per-frame tunables. Takes effect from the next frame.
    pub fn update_config(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        if config != self.config {
            debug!("pitch session config updated: {:?}", config);
        }
        self.apply_config(config);
        Ok(())
    }

    /// Swap in an already validated config. Does not log, so it is safe to
    /// call from an audio callback.
    pub(crate) fn apply_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &SessionSettings {
        self.tracker.settings()
    }

    /// Feed raw samples. Every completed window is analysed immediately and
    /// replaces the pending estimate. A block containing NaN or infinity is
    /// rejected whole.
    pub fn push_samples(&mut self, block: &[f32]) -> Result<()> {
        if let Some(index) = first_non_finite(block) {
            return Err(PitchError::NonFiniteSample { index });
        }
        let PitchSession {
            config,
            accumulator,
            tracker,
            latest,
            frames,
        } = self;
        accumulator.push(block, |frame| {
            *latest = Some(tracker.process(frame, config));
            *frames += 1;
        });
        Ok(())
    }

    /// Analyse a complete frame directly, bypassing the accumulator.
    pub fn analyze_frame(&mut self, frame: AudioFrame<'_>) -> Result<PitchEstimate> {
        let estimate = self.tracker.analyze(frame, &self.config)?;
        self.latest = Some(estimate);
        self.frames += 1;
        Ok(estimate)
    }

    /// The estimate of the most recent frame, if one was produced since the
    /// last poll. Earlier unpolled estimates are superseded.
    pub fn poll_estimate(&mut self) -> Option<PitchEstimate> {
        self.latest.take()
    }

    pub fn history(&self) -> &HistoryState {
        self.tracker.history()
    }

    pub fn gate(&self) -> &GateState {
        self.tracker.gate()
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Frames analysed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// End the session and release its buffers.
    pub fn stop(self) {
        debug!("pitch session stopped after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateMode;

    fn settings() -> SessionSettings {
        SessionSettings::new(1024, 44100)
    }

    #[test]
    fn start_rejects_invalid_config() {
        assert_eq!(
            PitchSession::start(settings(), Config::default().with_bias(-1.0)).err(),
            Some(PitchError::InvalidBias(-1.0))
        );
        assert!(PitchSession::start(SessionSettings::new(0, 44100), Config::default()).is_err());
    }

    #[test]
    fn update_config_keeps_old_value_on_error() {
        let mut session = PitchSession::start(settings(), Config::default()).unwrap();
        assert!(session
            .update_config(Config::default().with_tolerance(1.5))
            .is_err());
        assert_eq!(*session.config(), Config::default());

        let config = Config::default().with_gate_mode(GateMode::Instant);
        session.update_config(config).unwrap();
        assert_eq!(session.config().gate_mode, GateMode::Instant);
    }

    #[test]
    fn poll_returns_latest_once() {
        let mut session = PitchSession::start(settings(), Config::default()).unwrap();
        assert_eq!(session.poll_estimate(), None);

        session.push_samples(&[0.0; 1000]).unwrap();
        assert_eq!(session.poll_estimate(), None);

        session.push_samples(&[0.0; 3000]).unwrap();
        assert_eq!(session.frames(), 3);
        assert_eq!(session.poll_estimate(), Some(PitchEstimate::Unvoiced));
        assert_eq!(session.poll_estimate(), None);
    }

    #[test]
    fn non_finite_block_is_rejected() {
        let mut session = PitchSession::start(settings(), Config::default()).unwrap();
        let mut block = vec![0.0f32; 16];
        block[5] = f32::NAN;
        assert_eq!(
            session.push_samples(&block),
            Err(PitchError::NonFiniteSample { index: 5 })
        );
        assert_eq!(session.frames(), 0);
    }
}
