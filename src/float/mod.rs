//! Generic [Float] type which acts as a stand-in for `f32` or `f64`.
use rustfft::num_traits::Float as NumFloat;
use rustfft::FftNum;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Signals are processed as arrays of [Float]s. A [Float] is normally `f32` or `f64`.
pub trait Float: Display + Debug + NumFloat + FftNum + Sum {}

impl Float for f64 {}
impl Float for f32 {}

/// Convert an index or count into `T`. Exact for every count that fits in an
/// audio frame.
#[inline]
pub fn from_usize<T: Float>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::infinity)
}

/// Convert a constant into `T`.
#[inline]
pub fn from_f64<T: Float>(x: f64) -> T {
    T::from_f64(x).unwrap_or_else(T::nan)
}

/// Absolute value. `Float` and `Signed` both provide `abs`, so generic code
/// goes through this helper instead of the method.
#[inline]
pub fn abs<T: Float>(x: T) -> T {
    <T as NumFloat>::abs(x)
}
