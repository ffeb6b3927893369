//! Synthetic mixture generation.
//!
//! Builds labeled synthetic mixtures from a library of pure-component
//! spectra for validating downstream unmixing. Every sample is a linear
//! combination of the pure components with known ratios, optionally
//! degraded by augmentations whose severity scales with a single
//! `complexity` knob; at 0 every augmentation is off and the mixtures are
//! exact.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{SpectralError, SpectralResult};
use crate::spectrum::{axes_match, axis_order, resample_linear};

/// Augmentation and determinism knobs for [`SyntheticDataGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Gaussian noise level, relative to each mixture's peak intensity.
    pub noise_level: f64,
    /// Amplitude of the smooth synthetic baseline added to each mixture.
    pub baseline_drift: f64,
    /// Joint augmentation severity in [0, 1]; 0 disables everything.
    pub complexity: f64,
    /// Explicit seed for byte-identical batches across runs; `None` draws
    /// from ambient entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            noise_level: 0.01,
            baseline_drift: 0.05,
            complexity: 1.0,
            seed: None,
        }
    }
}

struct PureComponent {
    name: String,
    intensities: Array1<f64>,
}

/// Generator of labeled synthetic mixtures over a shared wavenumber axis.
///
/// Components are resampled onto the generator's axis when added;
/// insertion order defines the column order of the ground-truth ratio
/// matrix.
pub struct SyntheticDataGenerator {
    wavenumbers: Array1<f64>,
    components: Vec<PureComponent>,
}

impl SyntheticDataGenerator {
    /// Creates a generator over the given axis.
    pub fn new(wavenumbers: Array1<f64>) -> SpectralResult<Self> {
        axis_order(&wavenumbers, "generator axis")?;
        Ok(Self {
            wavenumbers,
            components: Vec::new(),
        })
    }

    /// Adds a named pure-component spectrum, resampling it onto the shared
    /// axis when the source axis differs.
    pub fn add_component(
        &mut self,
        name: &str,
        axis: &Array1<f64>,
        intensities: &Array1<f64>,
    ) -> SpectralResult<()> {
        axis_order(axis, "pure component axis")?;
        if axis.len() != intensities.len() {
            return Err(SpectralError::shape_mismatch(
                axis.len(),
                intensities.len(),
                "pure component intensities",
            ));
        }

        let aligned = if axes_match(axis, &self.wavenumbers) {
            intensities.clone()
        } else {
            resample_linear(axis, intensities, &self.wavenumbers)
        };

        self.components.push(PureComponent {
            name: name.to_string(),
            intensities: aligned,
        });
        Ok(())
    }

    /// Names of the loaded components, in insertion order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    /// Generates `n_samples` labeled mixtures.
    ///
    /// For each sample one mixing ratio per entry of `ratio_ranges` is
    /// drawn uniformly from its interval; the drawn ratios are the ground
    /// truth. Augmentations are then applied in a fixed order (Gaussian
    /// noise, smooth baseline, peak suppression, axis warp), each scaled
    /// jointly by `options.complexity` and its own knob.
    ///
    /// # Arguments
    ///
    /// * `n_samples` - Number of mixture rows to generate
    /// * `ratio_ranges` - `(component_name, (lo, hi))` per component; the
    ///   order defines the ratio-matrix columns
    /// * `options` - Augmentation and seeding knobs
    ///
    /// # Returns
    ///
    /// `(mixtures, ratios)`: the synthetic matrix
    /// (`n_samples x axis_len`) and the ground-truth ratio matrix
    /// (`n_samples x n_components`).
    pub fn generate_batch(
        &self,
        n_samples: usize,
        ratio_ranges: &[(String, (f64, f64))],
        options: &GeneratorOptions,
    ) -> SpectralResult<(Array2<f64>, Array2<f64>)> {
        if self.components.is_empty() {
            return Err(SpectralError::empty_input("pure component library"));
        }
        if ratio_ranges.is_empty() {
            return Err(SpectralError::empty_input("ratio ranges"));
        }
        if !(0.0..=1.0).contains(&options.complexity) {
            return Err(SpectralError::invalid_parameter(
                "complexity",
                options.complexity.to_string(),
                "a value in [0, 1]",
            ));
        }

        let selected: Vec<&PureComponent> = ratio_ranges
            .iter()
            .map(|(name, range)| {
                if range.0 > range.1 {
                    return Err(SpectralError::invalid_parameter(
                        "ratio_ranges",
                        format!("({}, {})", range.0, range.1),
                        "lo <= hi",
                    ));
                }
                self.components
                    .iter()
                    .find(|c| c.name == *name)
                    .ok_or_else(|| {
                        SpectralError::invalid_parameter(
                            "ratio_ranges",
                            name.clone(),
                            "a loaded component name",
                        )
                    })
            })
            .collect::<SpectralResult<Vec<_>>>()?;

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n_points = self.wavenumbers.len();
        let mut mixtures = Array2::zeros((n_samples, n_points));
        let mut ratios = Array2::zeros((n_samples, selected.len()));

        for i in 0..n_samples {
            let mut drawn = Vec::with_capacity(selected.len());
            for (c, (_, (lo, hi))) in ratio_ranges.iter().enumerate() {
                let ratio = if hi > lo {
                    rng.gen_range(*lo..*hi)
                } else {
                    *lo
                };
                ratios[[i, c]] = ratio;
                drawn.push(ratio);
            }

            let sample = self.compose_mixture(&selected, &drawn, options, &mut rng);
            mixtures.row_mut(i).assign(&sample);
        }

        Ok((mixtures, ratios))
    }

    /// Generates one mixture from pre-drawn ratios. Exposed for callers
    /// composing their own batches.
    pub fn generate_mixture(
        &self,
        ratios: &[(String, f64)],
        options: &GeneratorOptions,
        rng: &mut StdRng,
    ) -> SpectralResult<Array1<f64>> {
        let selected: Vec<&PureComponent> = ratios
            .iter()
            .map(|(name, _)| {
                self.components
                    .iter()
                    .find(|c| c.name == *name)
                    .ok_or_else(|| {
                        SpectralError::invalid_parameter(
                            "ratios",
                            name.clone(),
                            "a loaded component name",
                        )
                    })
            })
            .collect::<SpectralResult<Vec<_>>>()?;
        let weights: Vec<f64> = ratios.iter().map(|(_, r)| *r).collect();
        Ok(self.compose_mixture(&selected, &weights, options, rng))
    }

    fn compose_mixture(
        &self,
        components: &[&PureComponent],
        ratios: &[f64],
        options: &GeneratorOptions,
        rng: &mut StdRng,
    ) -> Array1<f64> {
        let n_points = self.wavenumbers.len();
        let complexity = options.complexity;

        let mut mix = Array1::zeros(n_points);
        for (component, &ratio) in components.iter().zip(ratios.iter()) {
            mix.scaled_add(ratio, &component.intensities);
        }

        if complexity == 0.0 {
            return mix;
        }

        // 1. Additive Gaussian noise relative to the mixture's peak.
        let sigma = complexity * options.noise_level * max_abs(&mix);
        if sigma > 0.0 {
            for v in mix.iter_mut() {
                *v += sigma * gaussian(rng);
            }
        }

        // 2. Smooth synthetic baseline over a [0, 1] parameterization.
        let drift = complexity * options.baseline_drift;
        if drift > 0.0 {
            let degree = 1 + (5.0 * complexity).round() as usize;
            let coeffs: Vec<f64> = (0..=degree).map(|_| rng.gen_range(-drift..drift)).collect();
            for (j, v) in mix.iter_mut().enumerate() {
                let t = j as f64 / (n_points.saturating_sub(1)).max(1) as f64;
                *v += coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c);
            }
        }

        // 3. Random attenuation of a subset of local intensity maxima.
        if rng.gen::<f64>() < 0.3 * complexity {
            let peaks = local_maxima(&mix);
            for &p in &peaks {
                if rng.gen::<f64>() < 0.35 {
                    let strength = rng.gen_range(0.3..0.8);
                    let lo = p.saturating_sub(2);
                    let hi = (p + 3).min(n_points);
                    for j in lo..hi {
                        mix[j] *= strength;
                    }
                }
            }
        }

        // 4. Axis warp: small index-space shift and stretch.
        if rng.gen::<f64>() < 0.5 * complexity {
            let max_shift = 2.0 * complexity;
            let shift = rng.gen_range(-max_shift..max_shift);
            let stretch = rng.gen_range(1.0..1.0 + 0.005 * complexity);
            mix = warp_indices(&mix, shift, stretch);
        }

        mix
    }
}

fn max_abs(y: &Array1<f64>) -> f64 {
    y.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
}

/// Standard normal draw via Box–Muller on the uniform generator.
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Indices of strict local maxima (plateau edges count once).
fn local_maxima(y: &Array1<f64>) -> Vec<usize> {
    let n = y.len();
    let mut peaks = Vec::new();
    for i in 1..n.saturating_sub(1) {
        if y[i] > y[i - 1] && y[i] >= y[i + 1] {
            peaks.push(i);
        }
    }
    peaks
}

/// Samples `y` at `(i - center) * stretch + center + shift` with linear
/// interpolation and edge-value extension.
fn warp_indices(y: &Array1<f64>, shift: f64, stretch: f64) -> Array1<f64> {
    let n = y.len();
    let center = n as f64 / 2.0;
    Array1::from_shape_fn(n, |i| {
        let pos = (i as f64 - center) * stretch + center + shift;
        if pos <= 0.0 {
            y[0]
        } else if pos >= (n - 1) as f64 {
            y[n - 1]
        } else {
            let lo = pos.floor() as usize;
            let frac = pos - lo as f64;
            y[lo] * (1.0 - frac) + y[lo + 1] * frac
        }
    })
}
