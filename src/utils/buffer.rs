use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use crate::error::{PitchError, Result};
use crate::float::{from_usize, Float};

pub enum ComplexComponent {
    Re,
    Im,
}

/// Allocate a zeroed real buffer, reporting allocation failure instead of aborting.
/// All per-frame buffers are created this way when a detector or session starts.
pub fn new_real_buffer<T: Float>(size: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|e| PitchError::allocation(size, e))?;
    buffer.resize(size, T::zero());
    Ok(buffer)
}

/// Allocate a zeroed complex buffer, reporting allocation failure instead of aborting.
pub fn new_complex_buffer<T: Float>(size: usize) -> Result<Vec<Complex<T>>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|e| PitchError::allocation(size, e))?;
    buffer.resize(size, Complex::zero());
    Ok(buffer)
}

pub fn copy_real_to_complex<T: Float>(
    input: &[T],
    output: &mut [Complex<T>],
    component: ComplexComponent,
) {
    assert!(input.len() <= output.len());
    match component {
        ComplexComponent::Re => input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
            o.re = *i;
            o.im = T::zero();
        }),
        ComplexComponent::Im => input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
            o.im = *i;
            o.re = T::zero();
        }),
    }
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

pub fn copy_complex_to_real<T: Float>(
    input: &[Complex<T>],
    output: &mut [T],
    component: ComplexComponent,
) {
    assert!(input.len() <= output.len());
    match component {
        ComplexComponent::Re => input
            .iter()
            .map(|c| c.re)
            .zip(output.iter_mut())
            .for_each(|(i, o)| *o = i),
        ComplexComponent::Im => input
            .iter()
            .map(|c| c.im)
            .zip(output.iter_mut())
            .for_each(|(i, o)| *o = i),
    }

    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = T::zero());
}

/// Computes |x|^2 for each complex value x in `arr`. This function
/// modifies `arr` in place and leaves the complex component zero.
pub fn modulus_squared<T: Float>(arr: &mut [Complex<T>]) {
    for s in arr {
        s.re = s.re * s.re + s.im * s.im;
        s.im = T::zero();
    }
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T: Float>(arr: &[T]) -> T {
    arr.iter().map(|&s| s * s).sum::<T>()
}

/// Root mean square of `arr`; zero for an empty slice.
pub fn root_mean_square<T: Float>(arr: &[T]) -> T {
    if arr.is_empty() {
        return T::zero();
    }
    (square_sum(arr) / from_usize(arr.len())).sqrt()
}

/// Index of the first NaN or infinite sample, if any.
pub fn first_non_finite<T: Float>(arr: &[T]) -> Option<usize> {
    arr.iter().position(|s| !s.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn real_buffer_is_zeroed() {
        let buffer: Vec<f64> = new_real_buffer(5).unwrap();
        assert_eq!(buffer, vec![0.0; 5]);
    }

    #[test]
    fn rms_of_square_wave_is_amplitude() {
        let signal = [0.5, -0.5, 0.5, -0.5];
        assert_relative_eq!(root_mean_square(&signal[..]), 0.5);
        assert_eq!(root_mean_square::<f64>(&[]), 0.0);
    }

    #[test]
    fn complex_round_trip_pads_with_zeros() {
        let input = [1.0f64, 2.0];
        let mut complex = new_complex_buffer::<f64>(4).unwrap();
        complex[3] = Complex::new(9.0, 9.0);
        copy_real_to_complex(&input, &mut complex, ComplexComponent::Re);
        assert_eq!(complex[3], Complex::new(0.0, 0.0));

        let mut real = vec![7.0; 4];
        copy_complex_to_real(&complex[..2], &mut real, ComplexComponent::Re);
        assert_eq!(real, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn finds_first_non_finite_sample() {
        assert_eq!(first_non_finite(&[0.0, 0.1, -0.2]), None);
        assert_eq!(first_non_finite(&[0.0, f32::NAN, f32::INFINITY]), Some(1));
        assert_eq!(first_non_finite(&[0.0, 1.0, f64::NEG_INFINITY]), Some(2));
    }
}
