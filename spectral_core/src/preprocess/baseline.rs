//! Baseline estimation and removal.
//!
//! Two estimators: Asymmetric Least Squares (AsLS), the default for Raman
//! baselines, and a segmented low-percentile polynomial fit for quick
//! visual correction.

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use crate::error::{SpectralError, SpectralResult};
use crate::preprocess::poly::{polyfit, polyval};

/// Result of a baseline estimation.
#[derive(Debug, Clone)]
pub struct BaselineFit {
    /// Baseline-corrected signal, `y - baseline`.
    pub corrected: Array1<f64>,
    /// The estimated baseline `z`.
    pub baseline: Array1<f64>,
    /// Number of reweighting iterations performed.
    pub iterations: usize,
}

/// Asymmetric Least Squares baseline estimation.
///
/// Solves `(W + lam·DᵀD) z = W y` repeatedly, where `D` is the second
/// difference operator and `W` holds asymmetric weights: `p` where
/// `y > z`, `1 - p` elsewhere. Termination is by iteration count alone;
/// the algorithm makes no attempt to detect convergence.
///
/// The system matrix is pentadiagonal and positive definite, so each
/// iteration is solved with a banded Cholesky factorization in O(n).
///
/// # Arguments
///
/// * `y` - Input intensities
/// * `lam` - Smoothness penalty weight (typical 1e2..1e9)
/// * `p` - Asymmetry in (0, 1); small values hug the signal from below
/// * `n_iter` - Fixed number of reweighting iterations
pub fn asls_baseline(
    y: &Array1<f64>,
    lam: f64,
    p: f64,
    n_iter: usize,
) -> SpectralResult<BaselineFit> {
    if !(lam.is_finite() && lam > 0.0) {
        return Err(SpectralError::invalid_parameter(
            "lam",
            lam.to_string(),
            "a finite value > 0",
        ));
    }
    if !(p.is_finite() && p > 0.0 && p < 1.0) {
        return Err(SpectralError::invalid_parameter(
            "p",
            p.to_string(),
            "a value in (0, 1)",
        ));
    }
    if n_iter == 0 {
        return Err(SpectralError::invalid_parameter(
            "n_iter",
            "0",
            "at least one iteration",
        ));
    }
    let n = y.len();
    if n < 3 {
        return Err(SpectralError::invalid_parameter(
            "y",
            format!("{} points", n),
            "at least 3 points for a second-difference penalty",
        ));
    }

    // Bands of DᵀD for the (n-2) x n second-difference operator. Row j of
    // D carries the stencil (1, -2, 1) at columns j, j+1, j+2.
    let mut dd0 = vec![0.0; n];
    let mut dd1 = vec![0.0; n.saturating_sub(1)];
    let mut dd2 = vec![0.0; n.saturating_sub(2)];
    for j in 0..n - 2 {
        dd0[j] += 1.0;
        dd0[j + 1] += 4.0;
        dd0[j + 2] += 1.0;
        dd1[j] += -2.0;
        dd1[j + 1] += -2.0;
        dd2[j] += 1.0;
    }

    let mut w = vec![1.0; n];
    let mut z = Array1::zeros(n);

    for _ in 0..n_iter {
        let diag: Vec<f64> = (0..n).map(|i| w[i] + lam * dd0[i]).collect();
        let sub1: Vec<f64> = dd1.iter().map(|&v| lam * v).collect();
        let sub2: Vec<f64> = dd2.iter().map(|&v| lam * v).collect();
        let rhs: Vec<f64> = (0..n).map(|i| w[i] * y[i]).collect();

        let solution = solve_pentadiagonal(&diag, &sub1, &sub2, &rhs);
        z = Array1::from_vec(solution);

        for i in 0..n {
            w[i] = if y[i] > z[i] { p } else { 1.0 - p };
        }
    }

    Ok(BaselineFit {
        corrected: y - &z,
        baseline: z,
        iterations: n_iter,
    })
}

/// Row-wise [`asls_baseline`]; returns the corrected matrix.
pub fn asls_baseline_batch(
    matrix: &Array2<f64>,
    lam: f64,
    p: f64,
    n_iter: usize,
) -> SpectralResult<Array2<f64>> {
    let rows: Vec<Array1<f64>> = matrix
        .axis_iter(Axis(0))
        .map(|row| row.to_owned())
        .collect();

    let corrected = rows
        .par_iter()
        .map(|row| asls_baseline(row, lam, p, n_iter).map(|fit| fit.corrected))
        .collect::<SpectralResult<Vec<_>>>()?;

    let mut out = Array2::zeros(matrix.dim());
    for (i, row) in corrected.into_iter().enumerate() {
        out.row_mut(i).assign(&row);
    }
    Ok(out)
}

/// Solves `A x = rhs` for a symmetric positive definite pentadiagonal `A`
/// given by its diagonal and first/second sub-diagonals, via banded
/// Cholesky (`A = L Lᵀ` with the same bandwidth).
fn solve_pentadiagonal(diag: &[f64], sub1: &[f64], sub2: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut la = vec![0.0; n]; // L[i][i]
    let mut lb = vec![0.0; n.saturating_sub(1)]; // L[i+1][i]
    let mut lc = vec![0.0; n.saturating_sub(2)]; // L[i+2][i]

    for i in 0..n {
        let mut v = diag[i];
        if i >= 1 {
            v -= lb[i - 1] * lb[i - 1];
        }
        if i >= 2 {
            v -= lc[i - 2] * lc[i - 2];
        }
        // A is positive definite for positive weights; the clamp only
        // guards the factorization against roundoff at extreme lam.
        la[i] = v.max(f64::MIN_POSITIVE).sqrt();

        if i + 1 < n {
            let mut v = sub1[i];
            if i >= 1 {
                v -= lc[i - 1] * lb[i - 1];
            }
            lb[i] = v / la[i];
        }
        if i + 2 < n {
            lc[i] = sub2[i] / la[i];
        }
    }

    // Forward substitution: L u = rhs.
    let mut u = vec![0.0; n];
    for i in 0..n {
        let mut v = rhs[i];
        if i >= 1 {
            v -= lb[i - 1] * u[i - 1];
        }
        if i >= 2 {
            v -= lc[i - 2] * u[i - 2];
        }
        u[i] = v / la[i];
    }

    // Back substitution: Lᵀ x = u.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut v = u[i];
        if i + 1 < n {
            v -= lb[i] * x[i + 1];
        }
        if i + 2 < n {
            v -= lc[i] * x[i + 2];
        }
        x[i] = v / la[i];
    }
    x
}

/// Segmented low-percentile polynomial baseline correction.
///
/// The axis is split into `n_segments` windows; each window contributes an
/// anchor at (mean position, 5th-percentile intensity). A `poly_order`
/// polynomial through the anchors is subtracted from the signal. Inputs
/// with too few usable anchors are returned unchanged.
pub fn polynomial_baseline(
    axis: &Array1<f64>,
    y: &Array1<f64>,
    n_segments: usize,
    poly_order: usize,
) -> Array1<f64> {
    let n = y.len();
    if n == 0 || axis.len() != n {
        return y.clone();
    }
    let n_segments = n_segments.clamp(poly_order + 1, n);

    let mut anchor_x = Vec::with_capacity(n_segments);
    let mut anchor_y = Vec::with_capacity(n_segments);
    for s in 0..n_segments {
        let start = s * n / n_segments;
        let end = ((s + 1) * n / n_segments).min(n);
        if end <= start {
            continue;
        }
        let seg_x = axis.slice(ndarray::s![start..end]);
        let seg_y: Vec<f64> = y.slice(ndarray::s![start..end]).to_vec();
        anchor_x.push(seg_x.sum() / seg_x.len() as f64);
        anchor_y.push(percentile(&seg_y, 5.0));
    }

    match polyfit(&anchor_x, &anchor_y, poly_order) {
        Some(coeffs) => {
            let baseline = axis.mapv(|x| polyval(&coeffs, x));
            y - &baseline
        }
        None => y.clone(),
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaky_signal(n: usize) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        let axis = Array1::linspace(400.0, 1800.0, n);
        let peaks = axis.mapv(|w: f64| {
            2.0 * (-((w - 800.0) / 15.0).powi(2)).exp()
                + 1.5 * (-((w - 1400.0) / 20.0).powi(2)).exp()
        });
        let baseline = axis.mapv(|w: f64| 0.5 + 3.0e-4 * (w - 400.0));
        (axis, peaks, baseline)
    }

    #[test]
    fn test_pentadiagonal_solver_matches_dense() {
        use nalgebra::{DMatrix, DVector};

        let n = 12;
        let diag: Vec<f64> = (0..n).map(|i| 6.0 + (i as f64 * 0.37).sin().abs()).collect();
        let sub1 = vec![-3.9; n - 1];
        let sub2 = vec![0.95; n - 2];
        let rhs: Vec<f64> = (0..n).map(|i| (i as f64 * 0.77).cos()).collect();

        let x = solve_pentadiagonal(&diag, &sub1, &sub2, &rhs);

        let mut dense = DMatrix::zeros(n, n);
        for i in 0..n {
            dense[(i, i)] = diag[i];
            if i + 1 < n {
                dense[(i + 1, i)] = sub1[i];
                dense[(i, i + 1)] = sub1[i];
            }
            if i + 2 < n {
                dense[(i + 2, i)] = sub2[i];
                dense[(i, i + 2)] = sub2[i];
            }
        }
        let expected = dense
            .lu()
            .solve(&DVector::from_row_slice(&rhs))
            .expect("dense solve");

        for i in 0..n {
            assert!((x[i] - expected[i]).abs() < 1e-9, "row {i}");
        }
    }

    #[test]
    fn test_asls_recovers_slow_baseline() {
        let (_, peaks, baseline) = peaky_signal(600);
        let y = &peaks + &baseline;

        let fit = asls_baseline(&y, 1e5, 0.01, 10).unwrap();
        assert_eq!(fit.iterations, 10);

        // The estimated baseline tracks the slow component away from peaks,
        // and the corrected signal keeps the peaks roughly intact.
        let mean_abs_err: f64 = fit
            .baseline
            .iter()
            .zip(baseline.iter())
            .map(|(a, b)| (a - b).abs())
            .sum::<f64>()
            / baseline.len() as f64;
        assert!(mean_abs_err < 0.1, "baseline error {mean_abs_err}");

        let peak_idx = peaks
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(fit.corrected[peak_idx] > 1.5);
    }

    #[test]
    fn test_asls_rejects_bad_parameters() {
        let y = Array1::linspace(0.0, 1.0, 16);
        assert!(asls_baseline(&y, 0.0, 0.01, 10).is_err());
        assert!(asls_baseline(&y, 1e5, 1.5, 10).is_err());
        assert!(asls_baseline(&y, 1e5, 0.01, 0).is_err());
    }

    #[test]
    fn test_asls_batch_matches_single() {
        let (_, peaks, baseline) = peaky_signal(200);
        let y = &peaks + &baseline;
        let mut matrix = Array2::zeros((2, 200));
        matrix.row_mut(0).assign(&y);
        matrix.row_mut(1).assign(&(&y * 2.0));

        let batch = asls_baseline_batch(&matrix, 1e4, 0.01, 5).unwrap();
        let single = asls_baseline(&y, 1e4, 0.01, 5).unwrap();
        for j in 0..200 {
            assert!((batch[[0, j]] - single.corrected[j]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_polynomial_baseline_flattens_quadratic_background() {
        let axis = Array1::linspace(0.0, 100.0, 400);
        let background = axis.mapv(|x: f64| 1.0 + 0.02 * x + 1.0e-4 * x * x);
        let peak = axis.mapv(|x: f64| 3.0 * (-((x - 50.0) / 2.0).powi(2)).exp());
        let y = &background + &peak;

        let corrected = polynomial_baseline(&axis, &y, 40, 2);

        // Away from the peak the corrected signal sits near zero.
        let off_peak_mean: f64 = corrected
            .iter()
            .take(100)
            .map(|v| v.abs())
            .sum::<f64>()
            / 100.0;
        assert!(off_peak_mean < 0.1, "residual background {off_peak_mean}");
    }

    #[test]
    fn test_percentile_interpolates() {
        let vals = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&vals, 0.0) - 0.0).abs() < 1e-12);
        assert!((percentile(&vals, 50.0) - 2.0).abs() < 1e-12);
        assert!((percentile(&vals, 100.0) - 4.0).abs() < 1e-12);
        assert!((percentile(&vals, 25.0) - 1.0).abs() < 1e-12);
    }
}
