//! Small least-squares polynomial helpers shared by the baseline and
//! derivative stages.

use nalgebra::{DMatrix, DVector};

/// Fits a polynomial of the given degree to `(x, y)` by least squares and
/// returns its coefficients in ascending-power order.
///
/// Returns `None` when the system is too small or numerically singular.
pub(crate) fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() < degree + 1 {
        return None;
    }

    // Center and scale the abscissa to keep the Vandermonde system
    // well-conditioned for wavenumber-scale inputs.
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    let scale = x
        .iter()
        .map(|&v| (v - mean).abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let vandermonde = DMatrix::from_fn(x.len(), degree + 1, |i, j| {
        ((x[i] - mean) / scale).powi(j as i32)
    });
    let rhs = DVector::from_row_slice(y);

    let svd = vandermonde.svd(true, true);
    let scaled_coeffs = svd.solve(&rhs, 1e-12).ok()?;

    // Expand back to coefficients of the raw abscissa via the binomial
    // theorem on ((x - mean) / scale)^j.
    let mut coeffs = vec![0.0; degree + 1];
    for (j, &c) in scaled_coeffs.iter().enumerate() {
        let mut term = vec![0.0; j + 1];
        term[0] = 1.0;
        // Multiply out (x - mean)^j incrementally.
        for _ in 0..j {
            let mut next = vec![0.0; term.len()];
            for (k, &t) in term.iter().enumerate() {
                next[k] -= mean * t;
                if k + 1 < next.len() {
                    next[k + 1] += t;
                }
            }
            term = next;
        }
        let inv_scale = scale.powi(j as i32).recip();
        for (k, &t) in term.iter().enumerate() {
            coeffs[k] += c * t * inv_scale;
        }
    }
    Some(coeffs)
}

/// Evaluates a polynomial with ascending-power coefficients at `x`.
pub(crate) fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyfit_recovers_quadratic() {
        let x: Vec<f64> = (0..20).map(|i| 400.0 + 10.0 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 2.0 + 0.5 * v - 0.01 * v * v).collect();

        let coeffs = polyfit(&x, &y, 2).expect("fit succeeds");
        for (&xv, &yv) in x.iter().zip(y.iter()) {
            assert!((polyval(&coeffs, xv) - yv).abs() < 1e-6);
        }
    }

    #[test]
    fn test_polyfit_rejects_underdetermined() {
        assert!(polyfit(&[1.0, 2.0], &[1.0, 2.0], 3).is_none());
    }

    #[test]
    fn test_polyval_constant() {
        assert!((polyval(&[4.0], 123.0) - 4.0).abs() < 1e-12);
    }
}
