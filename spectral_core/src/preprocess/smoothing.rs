//! Savitzky–Golay smoothing.
//!
//! Local polynomial least-squares smoothing: each output point is the
//! value of a degree-`polyorder` polynomial fitted to the surrounding
//! window. The interior reduces to a fixed convolution; the first and last
//! half-windows are filled by evaluating the boundary-window fit at the
//! edge positions, so no samples are dropped.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use crate::error::{SpectralError, SpectralResult};
use crate::preprocess::poly::{polyfit, polyval};

/// Applies a Savitzky–Golay filter to one spectrum.
///
/// # Arguments
///
/// * `y` - Input intensities
/// * `window_length` - Window size; must be odd and no longer than `y`
/// * `polyorder` - Polynomial order; must be strictly less than the window
///
/// # Errors
///
/// Violating the window/order constraints is a usage error and returns
/// `InvalidParameter`.
pub fn savgol(y: &Array1<f64>, window_length: usize, polyorder: usize) -> SpectralResult<Array1<f64>> {
    if window_length % 2 == 0 || window_length < 3 {
        return Err(SpectralError::invalid_parameter(
            "window_length",
            window_length.to_string(),
            "an odd value >= 3",
        ));
    }
    if polyorder >= window_length {
        return Err(SpectralError::invalid_parameter(
            "polyorder",
            polyorder.to_string(),
            format!("strictly less than window_length ({})", window_length),
        ));
    }
    if y.len() < window_length {
        return Err(SpectralError::invalid_parameter(
            "window_length",
            window_length.to_string(),
            format!("no longer than the spectrum ({} points)", y.len()),
        ));
    }

    let n = y.len();
    let half = window_length / 2;
    let weights = convolution_weights(window_length, polyorder);

    let mut out = Array1::zeros(n);

    // Interior: fixed convolution with the center-evaluation weights.
    for i in half..n - half {
        let mut acc = 0.0;
        for (j, &w) in weights.iter().enumerate() {
            acc += w * y[i + j - half];
        }
        out[i] = acc;
    }

    // Boundaries: polynomial fitted to the first/last full window,
    // evaluated at the positions the convolution cannot reach.
    let positions: Vec<f64> = (0..window_length)
        .map(|j| j as f64 - half as f64)
        .collect();

    let head: Vec<f64> = y.iter().take(window_length).copied().collect();
    if let Some(coeffs) = polyfit(&positions, &head, polyorder) {
        for i in 0..half {
            out[i] = polyval(&coeffs, i as f64 - half as f64);
        }
    }

    let tail: Vec<f64> = y.iter().skip(n - window_length).copied().collect();
    if let Some(coeffs) = polyfit(&positions, &tail, polyorder) {
        let center = (n - 1 - half) as f64;
        for i in n - half..n {
            out[i] = polyval(&coeffs, i as f64 - center);
        }
    }

    Ok(out)
}

/// Row-wise [`savgol`] over a spectrum matrix.
pub fn savgol_batch(
    matrix: &Array2<f64>,
    window_length: usize,
    polyorder: usize,
) -> SpectralResult<Array2<f64>> {
    let rows: Vec<Array1<f64>> = matrix
        .axis_iter(Axis(0))
        .map(|row| row.to_owned())
        .collect();

    let smoothed = rows
        .par_iter()
        .map(|row| savgol(row, window_length, polyorder))
        .collect::<SpectralResult<Vec<_>>>()?;

    let mut out = Array2::zeros(matrix.dim());
    for (i, row) in smoothed.into_iter().enumerate() {
        out.row_mut(i).assign(&row);
    }
    Ok(out)
}

/// Least-squares convolution weights for evaluating the window fit at the
/// window center.
fn convolution_weights(window_length: usize, polyorder: usize) -> Vec<f64> {
    let half = window_length as i64 / 2;

    let design = DMatrix::from_fn(window_length, polyorder + 1, |i, j| {
        ((i as i64 - half) as f64).powi(j as i32)
    });
    let gram = design.transpose() * &design;

    // Weight vector h = A (AᵀA)⁻¹ e₀, so that h·window = fitted value at 0.
    let mut e0 = DVector::zeros(polyorder + 1);
    e0[0] = 1.0;
    let v = gram
        .svd(true, true)
        .solve(&e0, 1e-12)
        .expect("Gram matrix of a Savitzky-Golay window is nonsingular");

    (design * v).iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_even_window() {
        let y = Array1::linspace(0.0, 1.0, 32);
        assert!(matches!(
            savgol(&y, 8, 2),
            Err(SpectralError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_order_not_below_window() {
        let y = Array1::linspace(0.0, 1.0, 32);
        assert!(matches!(
            savgol(&y, 5, 5),
            Err(SpectralError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_polynomial_signal_is_reproduced() {
        // A quadratic is inside the model class of a polyorder-2 filter, so
        // smoothing must reproduce it exactly (including the boundaries).
        let y = Array1::from_iter((0..50).map(|i| {
            let x = i as f64;
            1.0 + 0.3 * x + 0.02 * x * x
        }));
        let smoothed = savgol(&y, 9, 2).unwrap();
        for (a, b) in y.iter().zip(smoothed.iter()) {
            assert!((a - b).abs() < 1e-8, "expected {a}, got {b}");
        }
    }

    #[test]
    fn test_noise_is_reduced() {
        // Deterministic pseudo-noise on a ramp; smoothing should shrink the
        // residual against the clean ramp.
        let clean = Array1::from_iter((0..200).map(|i| i as f64 * 0.01));
        let noisy = Array1::from_iter(
            clean
                .iter()
                .enumerate()
                .map(|(i, &v)| v + 0.05 * ((i as f64 * 12.9898).sin())),
        );

        let smoothed = savgol(&noisy, 15, 2).unwrap();

        let err_noisy: f64 = clean
            .iter()
            .zip(noisy.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        let err_smooth: f64 = clean
            .iter()
            .zip(smoothed.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        assert!(err_smooth < err_noisy * 0.5);
    }

    #[test]
    fn test_batch_matches_single() {
        let row = Array1::from_iter((0..40).map(|i| (i as f64 * 0.3).sin()));
        let mut matrix = Array2::zeros((3, 40));
        for i in 0..3 {
            matrix.row_mut(i).assign(&(&row * (i + 1) as f64));
        }

        let batch = savgol_batch(&matrix, 7, 3).unwrap();
        for i in 0..3 {
            let single = savgol(&(&row * (i + 1) as f64), 7, 3).unwrap();
            for j in 0..40 {
                assert!((batch[[i, j]] - single[j]).abs() < 1e-12);
            }
        }
    }
}
