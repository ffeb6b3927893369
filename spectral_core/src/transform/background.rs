//! Adaptive background subtraction.
//!
//! Learns a low-dimensional subspace for the dominant (background/mineral)
//! signal with an outlier-downweighted PCA, then isolates the residual
//! (organic) signal by subtracting each spectrum's projection onto that
//! subspace.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{SpectralError, SpectralResult};
use crate::transform::Transformer;

/// Configuration for [`AdaptiveBackgroundFilter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundFilterConfig {
    /// Dimensionality of the background subspace.
    pub n_components: usize,
    /// Fraction of the fitting set assumed to be outlier (signal-rich)
    /// rows, in [0, 1). These rows are dropped before the final fit.
    pub contamination: f64,
    /// Wavenumber bands (cm⁻¹) dominated by the residual signal of
    /// interest. When the filter knows its axis, these columns are masked
    /// out of the outlier scoring so organic-rich rows stand out. The
    /// defaults cover C–H stretch and carbonyl bands.
    pub signal_ranges: Vec<(f64, f64)>,
}

impl Default for BackgroundFilterConfig {
    fn default() -> Self {
        Self {
            n_components: 5,
            contamination: 0.1,
            signal_ranges: vec![(2800.0, 3050.0), (1600.0, 1750.0)],
        }
    }
}

/// Mean + principal directions of the background subspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Subspace {
    mean: Array1<f64>,
    /// One principal direction per row, `k x n_features`.
    components: Array2<f64>,
}

impl Subspace {
    fn fit(x: &Array2<f64>, n_components: usize) -> Self {
        let (n, f) = x.dim();
        let k = n_components.min(n).min(f).max(1);

        let mean = x.mean_axis(Axis(0)).expect("non-empty matrix");
        let centered = x - &mean;

        let dense = DMatrix::from_fn(n, f, |i, j| centered[[i, j]]);
        let svd = dense.svd(true, true);
        let v_t = svd.v_t.as_ref().expect("svd computed with v_t");

        let mut components = Array2::zeros((k, f));
        for c in 0..k {
            for j in 0..f {
                components[[c, j]] = v_t[(c, j)];
            }
        }
        Self { mean, components }
    }

    fn reconstruct_row(&self, x: &Array1<f64>) -> Array1<f64> {
        let centered = x - &self.mean;
        let latent = self.components.dot(&centered);
        self.components.t().dot(&latent) + &self.mean
    }

    fn residual_sq(&self, x: &Array1<f64>) -> f64 {
        let recon = self.reconstruct_row(x);
        x.iter()
            .zip(recon.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }
}

/// Robust background filter: `transform` returns each spectrum minus its
/// projection onto the learned background subspace.
///
/// A small fraction of signal-rich outlier rows in the fitting set must
/// not drag the subspace toward the signal; the two-pass fit (provisional
/// PCA → residual-based culling → refit) provides that robustness.
///
/// `inverse_transform` adds the background reconstruction back, which
/// restores the low-rank part only; the subtraction is lossy for
/// anything the subspace explained.
#[derive(Debug, Clone)]
pub struct AdaptiveBackgroundFilter {
    config: BackgroundFilterConfig,
    wavenumbers: Option<Array1<f64>>,
    subspace: Option<Subspace>,
    n_features: usize,
}

impl AdaptiveBackgroundFilter {
    pub fn new(config: BackgroundFilterConfig) -> Self {
        Self {
            config,
            wavenumbers: None,
            subspace: None,
            n_features: 0,
        }
    }

    /// Attaches the wavenumber axis so `signal_ranges` can be masked
    /// during outlier scoring. Optional; without it the scoring uses every
    /// column.
    pub fn with_wavenumbers(mut self, wavenumbers: Array1<f64>) -> Self {
        self.wavenumbers = Some(wavenumbers);
        self
    }

    /// Splits one spectrum into `(original, background, residual)` using
    /// the fitted subspace.
    pub fn decompose(
        &self,
        spectrum: &Array1<f64>,
    ) -> SpectralResult<(Array1<f64>, Array1<f64>, Array1<f64>)> {
        let subspace = self
            .subspace
            .as_ref()
            .ok_or_else(|| SpectralError::not_fitted("decompose"))?;
        if spectrum.len() != self.n_features {
            return Err(SpectralError::shape_mismatch(
                self.n_features,
                spectrum.len(),
                "decompose input",
            ));
        }
        let background = subspace.reconstruct_row(spectrum);
        let residual = spectrum - &background;
        Ok((spectrum.clone(), background, residual))
    }

    /// Column mask: true where the wavenumber lies outside every signal
    /// range (i.e. usable for background scoring).
    fn background_columns(&self, n_features: usize) -> Vec<bool> {
        match &self.wavenumbers {
            Some(axis) if axis.len() == n_features => axis
                .iter()
                .map(|&w| {
                    !self
                        .config
                        .signal_ranges
                        .iter()
                        .any(|&(lo, hi)| w >= lo && w <= hi)
                })
                .collect(),
            _ => vec![true; n_features],
        }
    }
}

impl Transformer for AdaptiveBackgroundFilter {
    fn fit(&mut self, x: &Array2<f64>) -> SpectralResult<()> {
        let (n, f) = x.dim();
        if n == 0 || f == 0 {
            return Err(SpectralError::empty_input("fitting matrix"));
        }
        if self.config.n_components == 0 {
            return Err(SpectralError::invalid_parameter(
                "n_components",
                "0",
                "at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.config.contamination) {
            return Err(SpectralError::invalid_parameter(
                "contamination",
                self.config.contamination.to_string(),
                "a fraction in [0, 1)",
            ));
        }

        // 1. Score rows on background-dominated columns only.
        let mask = self.background_columns(f);
        let masked_cols: Vec<usize> = (0..f).filter(|&j| mask[j]).collect();
        let masked = if masked_cols.len() == f {
            x.clone()
        } else {
            let mut m = Array2::zeros((n, masked_cols.len()));
            for (jj, &j) in masked_cols.iter().enumerate() {
                m.column_mut(jj).assign(&x.column(j));
            }
            m
        };

        // 2. Provisional subspace and per-row reconstruction residuals.
        let provisional = Subspace::fit(&masked, self.config.n_components);
        let residuals: Vec<f64> = masked
            .axis_iter(Axis(0))
            .map(|row| provisional.residual_sq(&row.to_owned()))
            .collect();

        // 3. Drop the most signal-rich rows.
        let keep = if self.config.contamination > 0.0 && n > 1 {
            let mut sorted = residuals.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let cutoff_rank =
                ((1.0 - self.config.contamination) * (n - 1) as f64).round() as usize;
            let cutoff = sorted[cutoff_rank.min(n - 1)];
            let kept: Vec<usize> = (0..n).filter(|&i| residuals[i] <= cutoff).collect();
            if kept.is_empty() {
                (0..n).collect()
            } else {
                kept
            }
        } else {
            (0..n).collect()
        };

        if keep.len() < n {
            tracing::warn!(
                "background fit dropped {} of {} rows as signal-rich outliers",
                n - keep.len(),
                n
            );
        }

        // 4. Final fit on the clean rows, full columns.
        let mut clean = Array2::zeros((keep.len(), f));
        for (ii, &i) in keep.iter().enumerate() {
            clean.row_mut(ii).assign(&x.row(i));
        }
        self.subspace = Some(Subspace::fit(&clean, self.config.n_components));
        self.n_features = f;
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> SpectralResult<Array2<f64>> {
        let subspace = self
            .subspace
            .as_ref()
            .ok_or_else(|| SpectralError::not_fitted("transform"))?;
        if x.ncols() != self.n_features {
            return Err(SpectralError::shape_mismatch(
                self.n_features,
                x.ncols(),
                "transform input columns",
            ));
        }

        let mut out = Array2::zeros(x.dim());
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            let row = row.to_owned();
            let background = subspace.reconstruct_row(&row);
            out.row_mut(i).assign(&(&row - &background));
        }
        Ok(out)
    }

    fn inverse_transform(&self, h: &Array2<f64>) -> SpectralResult<Array2<f64>> {
        let subspace = self
            .subspace
            .as_ref()
            .ok_or_else(|| SpectralError::not_fitted("inverse_transform"))?;
        if h.ncols() != self.n_features {
            return Err(SpectralError::shape_mismatch(
                self.n_features,
                h.ncols(),
                "inverse_transform input columns",
            ));
        }

        // Residual plus the subspace mean is the best available
        // reconstruction; the removed projection is not recoverable from
        // the residual alone.
        let mut out = Array2::zeros(h.dim());
        for (i, row) in h.axis_iter(Axis(0)).enumerate() {
            out.row_mut(i).assign(&(&row.to_owned() + &subspace.mean));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(f: usize, center: f64, width: f64) -> Array1<f64> {
        Array1::from_shape_fn(f, |j| {
            let t = j as f64 / f as f64;
            (-((t - center) / width).powi(2)).exp()
        })
    }

    /// Rank-2 mineral background in varying proportions.
    fn background_rows(n: usize, f: usize) -> Array2<f64> {
        let p1 = gaussian(f, 0.25, 0.12);
        let p2 = gaussian(f, 0.65, 0.18);
        Array2::from_shape_fn((n, f), |(i, j)| {
            let a = 0.3 + 0.5 * ((i as f64 * 0.71).sin().abs());
            a * p1[j] + (1.0 - a) * p2[j]
        })
    }

    #[test]
    fn test_background_rows_become_near_zero_residuals() {
        let x = background_rows(24, 60);
        let mut filter = AdaptiveBackgroundFilter::new(BackgroundFilterConfig {
            n_components: 2,
            contamination: 0.0,
            signal_ranges: vec![],
        });
        filter.fit(&x).unwrap();

        let residuals = filter.transform(&x).unwrap();
        let max_abs = residuals.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
        assert!(max_abs < 1e-8, "residual magnitude {max_abs}");
    }

    #[test]
    fn test_organic_peak_survives_subtraction() {
        let x = background_rows(24, 60);
        let mut filter = AdaptiveBackgroundFilter::new(BackgroundFilterConfig {
            n_components: 2,
            contamination: 0.0,
            signal_ranges: vec![],
        });
        filter.fit(&x).unwrap();

        // A query carrying the background plus an organic peak.
        let organic = gaussian(60, 0.9, 0.03);
        let query = &x.row(0).to_owned() + &(&organic * 0.8);
        let (_, _, residual) = filter.decompose(&query).unwrap();

        let peak_idx = organic
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            residual[peak_idx] > 0.4,
            "organic peak suppressed to {}",
            residual[peak_idx]
        );
    }

    #[test]
    fn test_outliers_do_not_dominate_the_subspace() {
        let f = 60;
        let clean = background_rows(27, f);
        let organic = gaussian(f, 0.9, 0.03);

        // Contaminate three rows with a strong organic component.
        let mut contaminated = Array2::zeros((30, f));
        for i in 0..27 {
            contaminated.row_mut(i).assign(&clean.row(i));
        }
        for i in 27..30 {
            let row = &clean.row(i - 27).to_owned() + &(&organic * 5.0);
            contaminated.row_mut(i).assign(&row);
        }

        let mut robust = AdaptiveBackgroundFilter::new(BackgroundFilterConfig {
            n_components: 2,
            contamination: 0.15,
            signal_ranges: vec![],
        });
        robust.fit(&contaminated).unwrap();

        // The organic direction must not be absorbed into the background:
        // a background-plus-organic query keeps its organic peak.
        let query = &clean.row(0).to_owned() + &(&organic * 0.8);
        let (_, _, residual) = robust.decompose(&query).unwrap();
        let peak_idx = organic
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            residual[peak_idx] > 0.4,
            "robust fit lost the organic peak: {}",
            residual[peak_idx]
        );
    }

    #[test]
    fn test_signal_range_masking_uses_axis() {
        let f = 60;
        let axis = Array1::linspace(400.0, 3200.0, f);
        let x = background_rows(20, f);

        let mut filter = AdaptiveBackgroundFilter::new(BackgroundFilterConfig {
            n_components: 2,
            contamination: 0.1,
            signal_ranges: vec![(2800.0, 3050.0)],
        })
        .with_wavenumbers(axis);

        filter.fit(&x).unwrap();
        assert!(filter.transform(&x).is_ok());
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let filter = AdaptiveBackgroundFilter::new(BackgroundFilterConfig::default());
        let x = Array2::zeros((2, 8));
        assert!(matches!(
            filter.transform(&x),
            Err(SpectralError::NotFitted { .. })
        ));
    }
}
