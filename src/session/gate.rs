//! RMS noise gate in front of the detectors.

use crate::config::GateMode;
use crate::utils::buffer::root_mean_square;

/// Weight of the previous smoothed RMS in the moving average.
pub const RMS_SMOOTHING: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GateState {
    pub instant_rms: f64,
    pub smoothed_rms: f64,
    pub is_open: bool,
}

impl GateState {
    /// Update the RMS values from `frame` and decide whether it is voiced.
    /// A threshold of zero or less keeps the gate open.
    pub fn evaluate(&mut self, frame: &[f64], threshold: f64, mode: GateMode) -> bool {
        self.instant_rms = root_mean_square(frame);
        self.smoothed_rms =
            self.instant_rms * (1.0 - RMS_SMOOTHING) + self.smoothed_rms * RMS_SMOOTHING;

        let rms = match mode {
            GateMode::Smooth => self.smoothed_rms,
            GateMode::Instant => self.instant_rms,
        };
        self.is_open = threshold <= 0.0 || rms >= threshold;
        self.is_open
    }

    pub fn reset(&mut self) {
        *self = GateState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn smoothed_rms_is_moving_average() {
        let mut gate = GateState::default();
        let frame = [0.5, -0.5, 0.5, -0.5];

        gate.evaluate(&frame, 0.0, GateMode::Smooth);
        assert_relative_eq!(gate.instant_rms, 0.5);
        assert_relative_eq!(gate.smoothed_rms, 0.025, epsilon = 1e-12);

        gate.evaluate(&frame, 0.0, GateMode::Smooth);
        assert_relative_eq!(gate.smoothed_rms, 0.025 + 0.025 * 0.95, epsilon = 1e-12);
    }

    #[test]
    fn smooth_mode_opens_slowly() {
        let mut gate = GateState::default();
        let frame = [0.5, -0.5, 0.5, -0.5];
        assert!(!gate.evaluate(&frame, 0.1, GateMode::Smooth));

        let mut gate = GateState::default();
        assert!(gate.evaluate(&frame, 0.1, GateMode::Instant));
    }

    #[test]
    fn smooth_mode_rides_over_a_short_dip() {
        let mut gate = GateState::default();
        let loud = [0.5, -0.5, 0.5, -0.5];
        for _ in 0..100 {
            gate.evaluate(&loud, 0.1, GateMode::Smooth);
        }
        assert!(gate.evaluate(&[0.0; 4], 0.1, GateMode::Smooth));

        let mut instant = gate;
        assert!(!instant.evaluate(&[0.0; 4], 0.1, GateMode::Instant));
    }

    #[test]
    fn zero_threshold_disables_gate() {
        let mut gate = GateState::default();
        assert!(gate.evaluate(&[0.0; 8], 0.0, GateMode::Smooth));
        assert!(gate.evaluate(&[0.0; 8], -1.0, GateMode::Instant));
    }

    #[test]
    fn reset_clears_levels() {
        let mut gate = GateState::default();
        gate.evaluate(&[1.0; 8], 0.0, GateMode::Smooth);
        gate.reset();
        assert_eq!(gate, GateState::default());
    }
}
