//! A session split across a control thread and an audio thread.
//!
//! [`start`] returns a [`SessionController`] for the UI or control side and a
//! [`SessionProcessor`] to move into the audio callback. The audio side never
//! logs, and it neither locks nor allocates after `start`:
//!
//! * config updates travel over a bounded SPSC ring and are drained at the
//!   top of every [`SessionProcessor::push_samples`], latest value wins;
//! * estimates travel back through one atomic cell plus a sequence counter,
//!   so a poll sees either nothing new or one complete estimate;
//! * stopping is an atomic flag the processor checks once per block.
//!
//! ```
//! use vocal_pitch::session::realtime;
//! use vocal_pitch::{Config, GateMode, SessionSettings};
//!
//! let settings = SessionSettings::new(2048, 44100);
//! let config = Config::default().with_gate_mode(GateMode::Instant);
//! let (mut controller, mut processor) = realtime::start(settings, config).unwrap();
//!
//! let block: Vec<f32> = (0..2048)
//!     .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! processor.push_samples(&block).unwrap();
//!
//! let estimate = controller.poll_estimate().unwrap();
//! assert!((estimate.frequency().unwrap() - 220.0).abs() < 1.0);
//! controller.stop();
//! ```

use std::sync::atomic::{fence, AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::{Config, SessionSettings};
use crate::detector::internals::Pitch;
use crate::error::{PitchError, Result};
use crate::session::tracker::PitchEstimate;
use crate::session::PitchSession;

/// Config updates that may be in flight before the audio side drains them.
pub const CONFIG_QUEUE_CAPACITY: usize = 8;

struct Shared {
    stopped: AtomicBool,
    /// Packed estimate, see [`pack_estimate`].
    estimate: AtomicU64,
    /// Odd while a publish is in progress, advances by two per estimate.
    sequence: AtomicU64,
    /// Smoothed input RMS as `f64` bits.
    level: AtomicU64,
}

impl Shared {
    fn new() -> Arc<Self> {
        Arc::new(Shared {
            stopped: AtomicBool::new(false),
            estimate: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            level: AtomicU64::new(0.0f64.to_bits()),
        })
    }

    fn publish(&self, estimate: PitchEstimate) {
        self.sequence.fetch_add(1, Ordering::Relaxed);
        fence(Ordering::Release);
        self.estimate
            .store(pack_estimate(estimate), Ordering::Relaxed);
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// The estimate published after `last_seen`, paired with the sequence it
    /// was published under. A publish racing the read is retried.
    fn read(&self, last_seen: &mut u64) -> Option<PitchEstimate> {
        loop {
            let before = self.sequence.load(Ordering::Acquire);
            if before == *last_seen {
                return None;
            }
            if before % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let bits = self.estimate.load(Ordering::Relaxed);
            fence(Ordering::Acquire);
            if self.sequence.load(Ordering::Relaxed) == before {
                *last_seen = before;
                return Some(unpack_estimate(bits));
            }
        }
    }
}

/// Frequency bits in the high word, clarity bits in the low word, both as
/// `f32`. A voiced frequency is always positive, so all-zero means unvoiced.
fn pack_estimate(estimate: PitchEstimate) -> u64 {
    match estimate {
        PitchEstimate::Voiced(pitch) => {
            let frequency = (pitch.frequency as f32).to_bits() as u64;
            let clarity = (pitch.clarity as f32).to_bits() as u64;
            frequency << 32 | clarity
        }
        PitchEstimate::Unvoiced => 0,
    }
}

fn unpack_estimate(bits: u64) -> PitchEstimate {
    let frequency = f32::from_bits((bits >> 32) as u32);
    if frequency > 0.0 {
        PitchEstimate::Voiced(Pitch {
            frequency: f64::from(frequency),
            clarity: f64::from(f32::from_bits(bits as u32)),
        })
    } else {
        PitchEstimate::Unvoiced
    }
}

/// Start a session whose audio half runs on another thread.
///
/// All buffers are allocated here, on the calling thread.
pub fn start(
    settings: SessionSettings,
    config: Config,
) -> Result<(SessionController, SessionProcessor)> {
    let session = PitchSession::start(settings, config)?;
    let (config_tx, config_rx) = RingBuffer::new(CONFIG_QUEUE_CAPACITY);
    let shared = Shared::new();

    let controller = SessionController {
        config_tx,
        shared: Arc::clone(&shared),
        last_seen: 0,
    };
    let processor = SessionProcessor {
        config_rx,
        shared,
        session: Some(session),
    };
    Ok((controller, processor))
}

/// Control side of a realtime session.
///
/// Dropping the controller stops the session as well.
pub struct SessionController {
    config_tx: Producer<Config>,
    shared: Arc<Shared>,
    last_seen: u64,
}

impl SessionController {
    /// Queue a config for the audio side. It takes effect at the start of the
    /// next block the processor receives.
    pub fn update_config(&mut self, config: Config) -> Result<()> {
        if self.shared.stopped.load(Ordering::Acquire) {
            return Err(PitchError::SessionStopped);
        }
        config.validate()?;
        self.config_tx.push(config).map_err(|_| {
            warn!("pitch session config queue full, dropping {:?}", config);
            PitchError::ConfigQueueFull
        })?;
        debug!("pitch session config queued: {:?}", config);
        Ok(())
    }

    /// The most recent estimate, if the processor produced one since the
    /// previous poll.
    pub fn poll_estimate(&mut self) -> Option<PitchEstimate> {
        self.shared.read(&mut self.last_seen)
    }

    /// Smoothed RMS of the input as of the last processed block.
    pub fn input_level(&self) -> f64 {
        f64::from_bits(self.shared.level.load(Ordering::Relaxed))
    }

    /// Ask the processor to stop. It releases its buffers at its next block.
    pub fn stop(self) {
        debug!("pitch session stop requested; processor releases its buffers on its next block");
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::Release);
    }
}

/// Audio side of a realtime session. Move it into the audio callback.
pub struct SessionProcessor {
    config_rx: Consumer<Config>,
    shared: Arc<Shared>,
    session: Option<PitchSession>,
}

impl SessionProcessor {
    /// Feed one block of samples. Never logs and never locks.
    ///
    /// Once the controller has stopped the session this drops the session's
    /// buffers and returns [`PitchError::SessionStopped`] for every call.
    pub fn push_samples(&mut self, block: &[f32]) -> Result<()> {
        if self.shared.stopped.load(Ordering::Acquire) {
            self.session = None;
            return Err(PitchError::SessionStopped);
        }
        let session = self.session.as_mut().ok_or(PitchError::SessionStopped)?;

        let mut latest = None;
        while let Ok(config) = self.config_rx.pop() {
            latest = Some(config);
        }
        if let Some(config) = latest {
            session.apply_config(config);
        }

        session.push_samples(block)?;
        self.shared
            .level
            .store(session.gate().smoothed_rms.to_bits(), Ordering::Relaxed);
        if let Some(estimate) = session.poll_estimate() {
            self.shared.publish(estimate);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some() && !self.shared.stopped.load(Ordering::Acquire)
    }
}
