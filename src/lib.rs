//! # Vocal Pitch
//! *vocal_pitch* tracks the fundamental frequency of a single voice in real
//! time. Audio arrives in blocks of any size, is collected into fixed analysis
//! windows, passed through a noise gate and analysed with a probabilistic YIN
//! detector that leans toward the previously detected pitch to avoid octave
//! jumps and jitter.
//!
//! # Detectors
//! A *detector* is an implementation of a pitch detection algorithm. A session
//! can switch between them from one frame to the next.
//!
//!   * [PYinDetector][detector::pyin] (default)
//!   * [YINDetector][detector::yin]
//!   * [McLeodDetector][detector::mcleod]
//!
//! # Sessions
//! A [PitchSession] owns every buffer, the gate state and the pitch history.
//! [session::realtime] splits one across a control thread and an audio thread.
//!
//! # Examples
//! ```
//! use vocal_pitch::{Config, GateMode, PitchEstimate, PitchSession, SessionSettings};
//!
//! fn main() {
//!     const SAMPLE_RATE: usize = 44100;
//!     const SIZE: usize = 2048;
//!
//!     let settings = SessionSettings::new(SIZE, SAMPLE_RATE);
//!     let config = Config::default().with_gate_mode(GateMode::Instant);
//!     let mut session = PitchSession::start(settings, config).unwrap();
//!
//!     // Signal coming from some source (microphone, generated, etc...)
//!     let dt = 1.0 / SAMPLE_RATE as f32;
//!     let freq = 300.0;
//!     let signal: Vec<f32> = (0..SIZE)
//!         .map(|x| (2.0 * std::f32::consts::PI * x as f32 * dt * freq).sin())
//!         .collect();
//!
//!     session.push_samples(&signal).unwrap();
//!
//!     if let Some(PitchEstimate::Voiced(pitch)) = session.poll_estimate() {
//!         println!("Frequency: {}, Clarity: {}", pitch.frequency, pitch.clarity);
//!     }
//!     session.stop();
//! }
//! ```

pub use config::{Algorithm, Config, GateMode, SessionSettings};
pub use detector::internals::Pitch;
pub use error::{PitchError, Result};
pub use session::gate::GateState;
pub use session::realtime::{SessionController, SessionProcessor};
pub use session::tracker::{AudioFrame, HistoryState, PitchEstimate};
pub use session::PitchSession;

pub mod config;
pub mod detector;
pub mod error;
pub mod float;
pub mod session;
pub mod utils;
