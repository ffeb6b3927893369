//! Axis-aware derivatives and polynomial approximation.

use ndarray::Array1;

use crate::preprocess::poly::{polyfit, polyval};

/// Central-difference gradient of `y` with respect to a possibly
/// non-uniform `axis`; one-sided differences at the ends.
pub fn gradient(axis: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
    let n = y.len().min(axis.len());
    let mut out = Array1::zeros(y.len());
    if n < 2 {
        return out;
    }

    out[0] = (y[1] - y[0]) / (axis[1] - axis[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (axis[n - 1] - axis[n - 2]);
    for i in 1..n - 1 {
        // Non-uniform central difference (numpy-style weighted form).
        let h_minus = axis[i] - axis[i - 1];
        let h_plus = axis[i + 1] - axis[i];
        let a = -h_plus / (h_minus * (h_minus + h_plus));
        let b = (h_plus - h_minus) / (h_minus * h_plus);
        let c = h_minus / (h_plus * (h_minus + h_plus));
        out[i] = a * y[i - 1] + b * y[i] + c * y[i + 1];
    }
    out
}

/// Second derivative: the gradient applied twice. Sharpens overlapping
/// peaks at the cost of noise amplification, so smoothing usually runs
/// first.
pub fn second_derivative(axis: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
    let first = gradient(axis, y);
    gradient(axis, &first)
}

/// Replaces the signal with its least-squares polynomial approximation of
/// the given degree. Inputs shorter than `degree + 1` (or numerically
/// singular fits) are returned unchanged.
pub fn polynomial_fit(axis: &Array1<f64>, y: &Array1<f64>, degree: usize) -> Array1<f64> {
    if y.len() != axis.len() || y.len() < degree + 1 {
        return y.clone();
    }
    let xs: Vec<f64> = axis.to_vec();
    let ys: Vec<f64> = y.to_vec();
    match polyfit(&xs, &ys, degree) {
        Some(coeffs) => axis.mapv(|x| polyval(&coeffs, x)),
        None => y.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_of_linear_ramp_is_constant() {
        let axis = Array1::linspace(0.0, 10.0, 21);
        let y = axis.mapv(|x: f64| 3.0 * x + 1.0);
        let g = gradient(&axis, &y);
        for v in g.iter() {
            assert!((v - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_second_derivative_of_quadratic_is_constant() {
        let axis = Array1::linspace(0.0, 5.0, 51);
        let y = axis.mapv(|x: f64| x * x);
        let d2 = second_derivative(&axis, &y);
        // Interior points; the one-sided ends are less accurate.
        for i in 2..d2.len() - 2 {
            assert!((d2[i] - 2.0).abs() < 1e-6, "index {i}: {}", d2[i]);
        }
    }

    #[test]
    fn test_gradient_handles_nonuniform_axis() {
        let axis = Array1::from_vec(vec![0.0, 1.0, 3.0, 6.0, 10.0]);
        let y = axis.mapv(|x: f64| 2.0 * x);
        let g = gradient(&axis, &y);
        for v in g.iter() {
            assert!((v - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_polynomial_fit_degenerates_to_input() {
        let axis = Array1::from_vec(vec![1.0, 2.0]);
        let y = Array1::from_vec(vec![5.0, 7.0]);
        let out = polynomial_fit(&axis, &y, 3);
        assert_eq!(out, y);
    }

    #[test]
    fn test_polynomial_fit_smooths_to_parabola() {
        let axis = Array1::linspace(0.0, 4.0, 30);
        let clean = axis.mapv(|x: f64| 1.0 - 0.5 * x + 0.25 * x * x);
        let noisy = Array1::from_iter(
            clean
                .iter()
                .enumerate()
                .map(|(i, &v)| v + 0.001 * ((i * 37) as f64).sin()),
        );
        let fitted = polynomial_fit(&axis, &noisy, 2);
        for (a, b) in clean.iter().zip(fitted.iter()) {
            assert!((a - b).abs() < 0.01);
        }
    }
}
