//! Bose–Einstein temperature correction.
//!
//! Stokes scattering intensity carries a temperature-dependent population
//! factor; multiplying by `1 − exp(−h·c·ω / (k·T))` removes that bias so
//! spectra taken at different temperatures become comparable.

use ndarray::Array1;

/// Planck constant, J·s.
const PLANCK_J_S: f64 = 6.626_070_15e-34;
/// Speed of light, cm/s; converts wavenumber (cm⁻¹) to frequency (Hz).
const LIGHT_SPEED_CM_S: f64 = 2.997_924_58e10;
/// Boltzmann constant, J/K.
const BOLTZMANN_J_K: f64 = 1.380_649e-23;

/// Applies the Bose–Einstein population-factor correction.
///
/// Each intensity is multiplied by `factor(ω) = 1 − exp(−h·c·ω / (k·T))`.
/// At ω = 0 the factor is 0 by definition (the elastic line carries no
/// usable population information), so degenerate axis values cannot cause
/// a division error; the formula contains no division at all.
///
/// # Arguments
///
/// * `axis` - Wavenumber axis in cm⁻¹
/// * `y` - Intensities, same length as `axis`
/// * `temp_k` - Sample temperature in Kelvin
pub fn bose_einstein(axis: &Array1<f64>, y: &Array1<f64>, temp_k: f64) -> Array1<f64> {
    let n = y.len().min(axis.len());
    let mut out = y.clone();
    for i in 0..n {
        let omega = axis[i];
        let factor = if omega == 0.0 || temp_k <= 0.0 {
            if omega == 0.0 {
                0.0
            } else {
                // T -> 0: every excited state is empty, factor -> 1.
                1.0
            }
        } else {
            1.0 - (-PLANCK_J_S * LIGHT_SPEED_CM_S * omega / (BOLTZMANN_J_K * temp_k)).exp()
        };
        out[i] = y[i] * factor;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_factor_is_zero_at_zero_wavenumber() {
        let axis = array![0.0, 500.0];
        let y = array![10.0, 10.0];
        let out = bose_einstein(&axis, &y, 300.0);
        assert_eq!(out[0], 0.0);
        assert!(out[1] > 0.0);
    }

    #[test]
    fn test_factor_approaches_one_at_high_wavenumber() {
        // h*c*3000 / (k*300) ≈ 14.4, so the factor is within 1e-6 of 1.
        let axis = array![3000.0];
        let y = array![5.0];
        let out = bose_einstein(&axis, &y, 300.0);
        assert!((out[0] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_warmer_sample_needs_stronger_correction() {
        let axis = array![300.0];
        let y = array![1.0];
        let cold = bose_einstein(&axis, &y, 100.0);
        let warm = bose_einstein(&axis, &y, 600.0);
        assert!(warm[0] < cold[0]);
    }

    #[test]
    fn test_nonpositive_temperature_leaves_population_empty() {
        let axis = array![500.0];
        let y = array![2.0];
        let out = bose_einstein(&axis, &y, 0.0);
        assert!((out[0] - 2.0).abs() < 1e-12);
    }
}
