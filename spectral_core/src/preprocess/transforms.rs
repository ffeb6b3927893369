//! Elementwise dynamic-range compression.
//!
//! Scattering intensity is physically non-negative, so both transforms
//! clip negatives (left over from baseline subtraction or noise) to zero
//! before compressing.

use ndarray::Array1;

/// `ln(1 + max(y, 0))` elementwise.
pub fn log_transform(y: &Array1<f64>) -> Array1<f64> {
    y.mapv(|v| v.max(0.0).ln_1p())
}

/// `sqrt(max(y, 0))` elementwise.
pub fn sqrt_transform(y: &Array1<f64>) -> Array1<f64> {
    y.mapv(|v| v.max(0.0).sqrt())
}
