//! Spectrum normalization.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Normalization modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// Divide by the maximum absolute intensity.
    Max,
    /// Divide by the trapezoidal integral over the wavenumber axis.
    Area,
    /// Standard Normal Variate: subtract the mean, divide by the standard
    /// deviation, per spectrum.
    Snv,
}

/// Normalizes one spectrum.
///
/// Degenerate inputs (flat or all-zero spectra whose denominator would be
/// zero) are returned unchanged with a diagnostic, never an error and never
/// a division by zero.
///
/// # Arguments
///
/// * `axis` - Wavenumber axis; only consulted for `Area`
/// * `y` - Input intensities
/// * `mode` - Normalization mode
pub fn normalize(axis: &Array1<f64>, y: &Array1<f64>, mode: NormalizationMode) -> Array1<f64> {
    match mode {
        NormalizationMode::Max => {
            let max_abs = y.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
            if max_abs == 0.0 {
                tracing::warn!("max-normalization of an all-zero spectrum; returning it unchanged");
                return y.clone();
            }
            y / max_abs
        }
        NormalizationMode::Area => {
            let area = trapezoid(axis, y);
            if area == 0.0 {
                tracing::warn!("area-normalization with zero integral; returning the spectrum unchanged");
                return y.clone();
            }
            y / area
        }
        NormalizationMode::Snv => {
            let n = y.len() as f64;
            if n == 0.0 {
                return y.clone();
            }
            let mean = y.sum() / n;
            let var = y.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if std == 0.0 {
                tracing::warn!("SNV of a constant spectrum; returning it unchanged");
                return y.clone();
            }
            y.mapv(|v| (v - mean) / std)
        }
    }
}

/// Row-wise [`normalize`] over a spectrum matrix.
pub fn normalize_batch(
    axis: &Array1<f64>,
    matrix: &Array2<f64>,
    mode: NormalizationMode,
) -> Array2<f64> {
    let mut out = Array2::zeros(matrix.dim());
    for (i, row) in matrix.axis_iter(Axis(0)).enumerate() {
        out.row_mut(i).assign(&normalize(axis, &row.to_owned(), mode));
    }
    out
}

/// Trapezoidal integral of `y` over `axis`. A descending axis yields a
/// negative signed area, which still normalizes consistently.
fn trapezoid(axis: &Array1<f64>, y: &Array1<f64>) -> f64 {
    let n = y.len().min(axis.len());
    if n < 2 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 1..n {
        area += 0.5 * (y[i] + y[i - 1]) * (axis[i] - axis[i - 1]);
    }
    area
}
