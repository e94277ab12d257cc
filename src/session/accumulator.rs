//! Collects arbitrarily sized sample blocks into fixed analysis windows.

use crate::error::Result;
use crate::utils::buffer::new_real_buffer;

/// Fixed-size analysis window fed from a stream of blocks.
///
/// The window is allocated once. After a full window has been handed out,
/// its first `hop` samples are discarded and the rest slide to the front, so
/// consecutive windows overlap by `size - hop` samples.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    window: Vec<f64>,
    filled: usize,
    hop: usize,
}

impl FrameAccumulator {
    pub fn new(size: usize, hop: usize) -> Result<Self> {
        Ok(FrameAccumulator {
            window: new_real_buffer(size)?,
            filled: 0,
            hop: hop.clamp(1, size.max(1)),
        })
    }

    /// Window length in samples.
    #[inline]
    pub fn size(&self) -> usize {
        self.window.len()
    }

    /// Samples buffered toward the next window.
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Append `block`, calling `on_frame` once for every window it completes.
    pub fn push<F>(&mut self, block: &[f32], mut on_frame: F)
    where
        F: FnMut(&[f64]),
    {
        let size = self.window.len();
        let mut rest = block;
        while !rest.is_empty() {
            let take = rest.len().min(size - self.filled);
            self.window[self.filled..self.filled + take]
                .iter_mut()
                .zip(&rest[..take])
                .for_each(|(w, &s)| *w = f64::from(s));
            self.filled += take;
            rest = &rest[take..];

            if self.filled == size {
                on_frame(&self.window);
                self.window.copy_within(self.hop.., 0);
                self.filled = size - self.hop;
            }
        }
    }

    /// Drop any partially collected window.
    pub fn clear(&mut self) {
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_one_frame_per_window() {
        let mut accumulator = FrameAccumulator::new(4, 4).unwrap();
        let mut frames = Vec::new();
        accumulator.push(&[1.0, 2.0, 3.0], |f| frames.push(f.to_vec()));
        assert!(frames.is_empty());
        assert_eq!(accumulator.filled(), 3);

        accumulator.push(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0], |f| frames.push(f.to_vec()));
        assert_eq!(
            frames,
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]
        );
        assert_eq!(accumulator.filled(), 1);
    }

    #[test]
    fn hop_overlaps_windows() {
        let mut accumulator = FrameAccumulator::new(4, 2).unwrap();
        let mut frames = Vec::new();
        let block: Vec<f32> = (1..=8).map(|i| i as f32).collect();
        accumulator.push(&block, |f| frames.push(f.to_vec()));
        assert_eq!(
            frames,
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![3.0, 4.0, 5.0, 6.0],
                vec![5.0, 6.0, 7.0, 8.0],
            ]
        );
    }

    #[test]
    fn small_blocks_accumulate() {
        let mut accumulator = FrameAccumulator::new(8, 8).unwrap();
        let mut count = 0;
        for _ in 0..64 {
            accumulator.push(&[0.0; 3], |_| count += 1);
        }
        assert_eq!(count, 64 * 3 / 8);
    }

    #[test]
    fn clear_discards_partial_window() {
        let mut accumulator = FrameAccumulator::new(4, 4).unwrap();
        accumulator.push(&[1.0, 2.0], |_| {});
        accumulator.clear();
        let mut frames = Vec::new();
        accumulator.push(&[5.0, 6.0, 7.0, 8.0], |f| frames.push(f.to_vec()));
        assert_eq!(frames, vec![vec![5.0, 6.0, 7.0, 8.0]]);
    }
}
