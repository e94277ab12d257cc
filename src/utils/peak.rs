use std::ops::Range;

use crate::float::{from_f64, from_usize, Float};

pub enum PeakCorrection {
    Quadratic,
    None,
}

struct Point<T: Float> {
    x: T,
    y: T,
}

/// A local minimum of a normalized difference function: a candidate period
/// `lag` (in samples) and the function value `error` at that lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<T: Float> {
    pub lag: usize,
    pub error: T,
}

fn detect_crossings<T: Float>(arr: &[T]) -> impl Iterator<Item = (usize, usize)> + '_ {
    arr.windows(2)
        .enumerate()
        .scan(
            None,
            |positive_zero_cross: &mut Option<usize>, (i, win)| match positive_zero_cross.take() {
                Some(idx) => {
                    if win[1] < T::zero() && win[0] > T::zero() {
                        *positive_zero_cross = None;
                        Some(Some((idx, i + 1)))
                    } else {
                        *positive_zero_cross = Some(idx);
                        Some(None)
                    }
                }
                None => {
                    if win[1] > T::zero() && win[0] < T::zero() {
                        *positive_zero_cross = Some(i + 1);
                    }
                    Some(None)
                }
            },
        )
        .flatten()
}

/// Maxima of each positive lobe of `arr`, i.e. between an upward and the next
/// downward zero crossing.
pub fn detect_peaks<T: Float>(arr: &[T]) -> impl Iterator<Item = (usize, T)> + '_ {
    detect_crossings(arr).map(move |(start, stop)| {
        let mut peak_idx = 0;
        let mut peak_val = -T::infinity();
        for (i, &val) in arr.iter().enumerate().take(stop).skip(start) {
            if val > peak_val {
                peak_val = val;
                peak_idx = i;
            }
        }
        (peak_idx, peak_val)
    })
}

pub fn choose_peak<I: Iterator<Item = (usize, T)>, T: Float>(
    mut peaks: I,
    threshold: T,
) -> Option<(usize, T)> {
    peaks.find(|p| p.1 > threshold)
}

/// Strict local minima of `arr` below `1.0`, for lags in `range`. Every
/// reported lag has a neighbour on each side, so `range` is clamped to
/// `1..arr.len() - 1`.
pub fn detect_valleys<T: Float>(
    arr: &[T],
    range: Range<usize>,
) -> impl Iterator<Item = Candidate<T>> + '_ {
    let start = range.start.max(1);
    let end = range.end.min(arr.len().saturating_sub(1));
    (start..end).filter_map(move |lag| {
        let error = arr[lag];
        if error < arr[lag - 1] && error < arr[lag + 1] && error < T::one() {
            Some(Candidate { lag, error })
        } else {
            None
        }
    })
}

pub fn correct_peak<T: Float>(peak: (usize, T), data: &[T], correction: PeakCorrection) -> (T, T) {
    match correction {
        PeakCorrection::Quadratic => {
            let idx = peak.0;
            if idx == 0 || idx + 1 >= data.len() {
                return (from_usize(idx), peak.1);
            }
            let point = quadratic_interpolation(
                Point {
                    x: from_usize(idx - 1),
                    y: data[idx - 1],
                },
                Point {
                    x: from_usize(idx),
                    y: data[idx],
                },
                Point {
                    x: from_usize(idx + 1),
                    y: data[idx + 1],
                },
            );
            (point.x, point.y)
        }
        PeakCorrection::None => (from_usize(peak.0), peak.1),
    }
}

/// Offset of the vertex of the parabola through `(-1, left)`, `(0, center)`,
/// `(1, right)`. Zero when the three points are collinear.
pub fn parabolic_shift<T: Float>(left: T, center: T, right: T) -> T {
    let denominator = from_f64::<T>(2.0) * (from_f64::<T>(2.0) * center - left - right);
    if denominator.is_zero() {
        return T::zero();
    }
    let shift = (right - left) / denominator;
    if shift.is_finite() {
        shift
    } else {
        T::zero()
    }
}

fn quadratic_interpolation<T: Float>(
    left: Point<T>,
    center: Point<T>,
    right: Point<T>,
) -> Point<T> {
    let shift = parabolic_shift(left.y, center.y, right.y);
    let x = center.x + shift;
    let y = center.y + from_f64::<T>(0.25) * (right.y - left.y) * shift;
    Point { x, y }
}
