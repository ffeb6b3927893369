//! Autoencoding spectral compressor.
//!
//! Two interchangeable variants behind one interface: a deep nonlinear
//! encoder/decoder trained by gradient descent (compiled behind the `deep`
//! cargo feature), and a shallow single-hidden-layer regression compressor
//! that is always available and serves as the guaranteed fallback. The
//! variant is resolved once at construction and recorded, so callers can
//! always find out which backend actually ran.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[cfg(feature = "deep")]
use rand::rngs::StdRng;
#[cfg(feature = "deep")]
use rand::{Rng, SeedableRng};

use crate::error::{SpectralError, SpectralResult};
use crate::transform::Transformer;

/// Configuration for the autoencoding compressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoencoderConfig {
    /// Latent dimensionality.
    pub n_components: usize,
    /// Hidden layer width of the deep variant.
    pub hidden_nodes: usize,
    /// Epoch budget for the deep variant. The cap is authoritative:
    /// reaching it is reported, never inferred away by a hidden tolerance.
    pub max_iter: usize,
    /// Request the deep backend. Honored only when the `deep` feature is
    /// compiled in; otherwise the shallow variant runs and says so.
    pub use_deep: bool,
    /// Gradient-descent step size for the deep variant.
    pub learning_rate: f64,
    /// Seed for weight initialization.
    pub seed: u64,
    /// Relative loss-improvement threshold that labels a fit "converged"
    /// in the report. Informational only.
    pub tolerance: f64,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            n_components: 6,
            hidden_nodes: 64,
            max_iter: 200,
            use_deep: true,
            learning_rate: 0.05,
            seed: 42,
            tolerance: 1e-8,
        }
    }
}

/// Which autoencoder variant actually runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoencoderBackend {
    /// Nonlinear encoder/decoder trained by gradient descent.
    Deep,
    /// SVD-based linear compressor (single hidden layer, least squares).
    Shallow,
}

/// Outcome of a fit, retrievable via
/// [`AutoencoderTransformer::fit_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    /// The variant that ran.
    pub backend: AutoencoderBackend,
    /// Number of training epochs actually executed.
    pub epochs_run: usize,
    /// Final mean-squared reconstruction error on the training data.
    pub final_loss: f64,
    /// Whether the relative-improvement tolerance was met before the
    /// iteration cap. `false` means "trained, possibly suboptimal"; it is
    /// a diagnostic, not a failure.
    pub converged: bool,
}

/// Per-feature standardization learned on the training data and inverted
/// on reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Standardizer {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl Standardizer {
    fn fit(x: &Array2<f64>) -> Self {
        let mean = x.mean_axis(Axis(0)).expect("non-empty matrix");
        let n = x.nrows() as f64;
        let mut var: Array1<f64> = Array1::zeros(x.ncols());
        for row in x.axis_iter(Axis(0)) {
            for (j, &v) in row.iter().enumerate() {
                var[j] += (v - mean[j]).powi(2);
            }
        }
        let std = var.mapv(|v| {
            let s = (v / n).sqrt();
            if s == 0.0 {
                1.0
            } else {
                s
            }
        });
        Self { mean, std }
    }

    fn apply(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.std
    }

    fn apply_row(&self, x: &Array1<f64>) -> Array1<f64> {
        (x - &self.mean) / &self.std
    }

    fn invert_row(&self, x: &Array1<f64>) -> Array1<f64> {
        x * &self.std + &self.mean
    }
}

#[cfg(feature = "deep")]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeepState {
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
    w3: Array2<f64>,
    b3: Array1<f64>,
    w4: Array2<f64>,
    b4: Array1<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShallowState {
    /// Top-k right singular vectors of the standardized training matrix,
    /// one component per row.
    components: Array2<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum FittedState {
    #[cfg(feature = "deep")]
    Deep(DeepState),
    Shallow(ShallowState),
}

/// The autoencoding compressor. See the module docs for the deep/shallow
/// duality.
#[derive(Debug, Clone)]
pub struct AutoencoderTransformer {
    config: AutoencoderConfig,
    backend: AutoencoderBackend,
    standardizer: Option<Standardizer>,
    state: Option<FittedState>,
    report: Option<FitReport>,
    n_features: usize,
}

impl AutoencoderTransformer {
    /// Creates a compressor, resolving the deep/shallow choice once from
    /// the config flag and the compiled feature set.
    pub fn new(config: AutoencoderConfig) -> Self {
        let backend = match (config.use_deep, cfg!(feature = "deep")) {
            (true, true) => AutoencoderBackend::Deep,
            (true, false) => {
                tracing::warn!(
                    "deep autoencoder backend is not compiled in; using the shallow compressor"
                );
                AutoencoderBackend::Shallow
            }
            (false, _) => AutoencoderBackend::Shallow,
        };

        Self {
            config,
            backend,
            standardizer: None,
            state: None,
            report: None,
            n_features: 0,
        }
    }

    /// The variant this instance runs.
    pub fn backend(&self) -> AutoencoderBackend {
        self.backend
    }

    /// The latest fit outcome, if `fit` has run.
    pub fn fit_report(&self) -> Option<&FitReport> {
        self.report.as_ref()
    }

    fn fitted_state(&self, operation: &str) -> SpectralResult<(&Standardizer, &FittedState)> {
        match (&self.standardizer, &self.state) {
            (Some(std), Some(state)) => Ok((std, state)),
            _ => Err(SpectralError::not_fitted(operation)),
        }
    }
}

impl Transformer for AutoencoderTransformer {
    fn fit(&mut self, x: &Array2<f64>) -> SpectralResult<()> {
        let (n, f) = x.dim();
        if n == 0 || f == 0 {
            return Err(SpectralError::empty_input("training matrix"));
        }
        if self.config.n_components == 0 || self.config.n_components > f {
            return Err(SpectralError::invalid_parameter(
                "n_components",
                self.config.n_components.to_string(),
                format!("between 1 and the feature count ({})", f),
            ));
        }

        let standardizer = Standardizer::fit(x);
        let x_std = standardizer.apply(x);

        let (state, report) = match self.backend {
            #[cfg(feature = "deep")]
            AutoencoderBackend::Deep => {
                let (state, report) = fit_deep(&self.config, &x_std);
                (FittedState::Deep(state), report)
            }
            #[cfg(not(feature = "deep"))]
            AutoencoderBackend::Deep => unreachable!("deep backend is never selected without the feature"),
            AutoencoderBackend::Shallow => {
                let (state, report) = fit_shallow(&self.config, &x_std)?;
                (FittedState::Shallow(state), report)
            }
        };

        if !report.converged {
            tracing::warn!(
                "autoencoder fit stopped at the iteration cap ({} epochs) with loss {:.3e}; \
                 the model is usable but possibly suboptimal",
                report.epochs_run,
                report.final_loss
            );
        }

        self.standardizer = Some(standardizer);
        self.state = Some(state);
        self.report = Some(report);
        self.n_features = f;
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> SpectralResult<Array2<f64>> {
        let (standardizer, state) = self.fitted_state("transform")?;
        if x.ncols() != self.n_features {
            return Err(SpectralError::shape_mismatch(
                self.n_features,
                x.ncols(),
                "transform input columns",
            ));
        }

        let mut out = Array2::zeros((x.nrows(), self.config.n_components));
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            let x_std = standardizer.apply_row(&row.to_owned());
            let latent = match state {
                #[cfg(feature = "deep")]
                FittedState::Deep(s) => encode_deep(s, &x_std),
                FittedState::Shallow(s) => s.components.dot(&x_std),
            };
            out.row_mut(i).assign(&latent);
        }
        Ok(out)
    }

    fn inverse_transform(&self, h: &Array2<f64>) -> SpectralResult<Array2<f64>> {
        let (standardizer, state) = self.fitted_state("inverse_transform")?;
        if h.ncols() != self.config.n_components {
            return Err(SpectralError::shape_mismatch(
                self.config.n_components,
                h.ncols(),
                "inverse_transform input columns",
            ));
        }

        let mut out = Array2::zeros((h.nrows(), self.n_features));
        for (i, row) in h.axis_iter(Axis(0)).enumerate() {
            let latent = row.to_owned();
            let x_std = match state {
                #[cfg(feature = "deep")]
                FittedState::Deep(s) => decode_deep(s, &latent),
                FittedState::Shallow(s) => s.components.t().dot(&latent),
            };
            out.row_mut(i).assign(&standardizer.invert_row(&x_std));
        }
        Ok(out)
    }
}

fn fit_shallow(
    config: &AutoencoderConfig,
    x_std: &Array2<f64>,
) -> SpectralResult<(ShallowState, FitReport)> {
    use nalgebra::DMatrix;

    let (n, f) = x_std.dim();
    let k = config.n_components;
    if k > n.min(f) {
        return Err(SpectralError::invalid_parameter(
            "n_components",
            k.to_string(),
            format!(
                "at most min(samples, features) = {} for the shallow compressor",
                n.min(f)
            ),
        ));
    }

    let dense = DMatrix::from_fn(n, f, |i, j| x_std[[i, j]]);
    let svd = dense.svd(true, true);
    let v_t = svd.v_t.as_ref().expect("svd computed with v_t");

    let mut components = Array2::zeros((k, f));
    for c in 0..k {
        for j in 0..f {
            components[[c, j]] = v_t[(c, j)];
        }
    }

    // Closed-form solution: reconstruction error is what remains in the
    // truncated singular directions.
    let mut loss = 0.0;
    for i in 0..n {
        let row = x_std.row(i).to_owned();
        let latent = components.dot(&row);
        let recon = components.t().dot(&latent);
        loss += row
            .iter()
            .zip(recon.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>();
    }
    loss /= (n * f) as f64;

    Ok((
        ShallowState { components },
        FitReport {
            backend: AutoencoderBackend::Shallow,
            epochs_run: 1,
            final_loss: loss,
            converged: true,
        },
    ))
}

#[cfg(feature = "deep")]
fn relu(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| v.max(0.0))
}

#[cfg(feature = "deep")]
fn relu_derivative(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

#[cfg(feature = "deep")]
fn accumulate_outer(acc: &mut Array2<f64>, a: &Array1<f64>, b: &Array1<f64>) {
    for i in 0..a.len() {
        for j in 0..b.len() {
            acc[[i, j]] += a[i] * b[j];
        }
    }
}

/// Encoder half: features → hidden → ReLU latent (non-negative by
/// construction, matching the physical mixing model downstream).
#[cfg(feature = "deep")]
fn encode_deep(state: &DeepState, x_std: &Array1<f64>) -> Array1<f64> {
    let h1 = relu(&(state.w1.dot(x_std) + &state.b1));
    relu(&(state.w2.dot(&h1) + &state.b2))
}

#[cfg(feature = "deep")]
fn decode_deep(state: &DeepState, latent: &Array1<f64>) -> Array1<f64> {
    let h2 = relu(&(state.w3.dot(latent) + &state.b3));
    state.w4.dot(&h2) + &state.b4
}

/// Full-batch gradient-descent training of the deep autoencoder with
/// manual backpropagation.
#[cfg(feature = "deep")]
fn fit_deep(config: &AutoencoderConfig, x_std: &Array2<f64>) -> (DeepState, FitReport) {
    let (n, f) = x_std.dim();
    let h = config.hidden_nodes.max(1);
    let k = config.n_components;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut init = |rows: usize, cols: usize, fan_in: usize| -> Array2<f64> {
        let scale = (2.0 / fan_in as f64).sqrt();
        Array2::from_shape_fn((rows, cols), |_| (rng.gen::<f64>() - 0.5) * 2.0 * scale)
    };

    let mut w1 = init(h, f, f);
    let mut b1 = Array1::zeros(h);
    let mut w2 = init(k, h, h);
    let mut b2 = Array1::zeros(k);
    let mut w3 = init(h, k, k);
    let mut b3 = Array1::zeros(h);
    let mut w4 = init(f, h, h);
    let mut b4 = Array1::zeros(f);

    let lr = config.learning_rate;
    let mut prev_loss = f64::INFINITY;
    let mut final_loss = 0.0;
    let mut epochs_run = 0;
    let mut converged = false;

    for epoch in 0..config.max_iter {
        let mut dw1 = Array2::zeros((h, f));
        let mut db1 = Array1::zeros(h);
        let mut dw2 = Array2::zeros((k, h));
        let mut db2 = Array1::zeros(k);
        let mut dw3 = Array2::zeros((h, k));
        let mut db3 = Array1::zeros(h);
        let mut dw4 = Array2::zeros((f, h));
        let mut db4 = Array1::zeros(f);

        let mut loss = 0.0;
        let grad_scale = 2.0 / (n as f64 * f as f64);

        for row in x_std.axis_iter(Axis(0)) {
            let xv = row.to_owned();

            let z1 = w1.dot(&xv) + &b1;
            let h1 = relu(&z1);
            let z2 = w2.dot(&h1) + &b2;
            let lat = relu(&z2);
            let z3 = w3.dot(&lat) + &b3;
            let h2 = relu(&z3);
            let out = w4.dot(&h2) + &b4;

            let diff = &out - &xv;
            loss += diff.iter().map(|v| v * v).sum::<f64>();

            let d_out = diff.mapv(|v| v * grad_scale);
            accumulate_outer(&mut dw4, &d_out, &h2);
            db4 += &d_out;

            let dh2 = w4.t().dot(&d_out);
            let dz3 = &dh2 * &relu_derivative(&z3);
            accumulate_outer(&mut dw3, &dz3, &lat);
            db3 += &dz3;

            let dlat = w3.t().dot(&dz3);
            let dz2 = &dlat * &relu_derivative(&z2);
            accumulate_outer(&mut dw2, &dz2, &h1);
            db2 += &dz2;

            let dh1 = w2.t().dot(&dz2);
            let dz1 = &dh1 * &relu_derivative(&z1);
            accumulate_outer(&mut dw1, &dz1, &xv);
            db1 += &dz1;
        }
        loss /= (n * f) as f64;

        w1 = &w1 - &(&dw1 * lr);
        b1 = &b1 - &(&db1 * lr);
        w2 = &w2 - &(&dw2 * lr);
        b2 = &b2 - &(&db2 * lr);
        w3 = &w3 - &(&dw3 * lr);
        b3 = &b3 - &(&db3 * lr);
        w4 = &w4 - &(&dw4 * lr);
        b4 = &b4 - &(&db4 * lr);

        epochs_run = epoch + 1;
        final_loss = loss;

        let improvement = prev_loss - loss;
        if improvement >= 0.0 && improvement <= config.tolerance * prev_loss.abs().max(1e-12) {
            converged = true;
            break;
        }
        prev_loss = loss;
    }

    (
        DeepState {
            w1,
            b1,
            w2,
            b2,
            w3,
            b3,
            w4,
            b4,
        },
        FitReport {
            backend: AutoencoderBackend::Deep,
            epochs_run,
            final_loss,
            converged,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_matrix(n: usize, f: usize) -> Array2<f64> {
        // Rank-2 structure: two smooth patterns in varying proportion.
        Array2::from_shape_fn((n, f), |(i, j)| {
            let t = j as f64 / f as f64;
            let a = (i as f64 * 0.37).sin().abs();
            let b = 1.0 - a;
            a * (-((t - 0.3) / 0.1).powi(2)).exp() + b * (-((t - 0.7) / 0.15).powi(2)).exp()
        })
    }

    fn small_config(n_components: usize) -> AutoencoderConfig {
        AutoencoderConfig {
            n_components,
            hidden_nodes: 16,
            max_iter: 300,
            learning_rate: 0.05,
            ..AutoencoderConfig::default()
        }
    }

    #[test]
    fn test_transform_before_fit_is_not_fitted() {
        let model = AutoencoderTransformer::new(AutoencoderConfig::default());
        let x = Array2::zeros((2, 8));
        assert!(matches!(
            model.transform(&x),
            Err(SpectralError::NotFitted { .. })
        ));
        assert!(matches!(
            model.inverse_transform(&x),
            Err(SpectralError::NotFitted { .. })
        ));
    }

    #[test]
    fn test_latent_dimension_matches_config() {
        let x = training_matrix(24, 20);
        let mut model = AutoencoderTransformer::new(small_config(3));
        model.fit(&x).unwrap();

        let latent = model.transform(&x).unwrap();
        assert_eq!(latent.dim(), (24, 3));

        let recon = model.inverse_transform(&latent).unwrap();
        assert_eq!(recon.dim(), (24, 20));
    }

    #[test]
    fn test_fit_report_records_backend() {
        let x = training_matrix(16, 12);
        let mut model = AutoencoderTransformer::new(small_config(2));
        model.fit(&x).unwrap();

        let report = model.fit_report().expect("report after fit");
        assert_eq!(report.backend, model.backend());
        assert!(report.epochs_run >= 1);
        assert!(report.final_loss.is_finite());
    }

    #[test]
    fn test_shallow_backend_when_deep_not_requested() {
        let config = AutoencoderConfig {
            use_deep: false,
            ..small_config(2)
        };
        let model = AutoencoderTransformer::new(config);
        assert_eq!(model.backend(), AutoencoderBackend::Shallow);
    }

    #[test]
    fn test_shallow_reconstruction_captures_rank_two_data() {
        let x = training_matrix(30, 25);
        let config = AutoencoderConfig {
            use_deep: false,
            ..small_config(2)
        };
        let mut model = AutoencoderTransformer::new(config);
        model.fit(&x).unwrap();

        // Rank-2 data compressed to 2 components loses almost nothing.
        let report = model.fit_report().unwrap();
        assert!(report.converged);
        assert!(report.final_loss < 1e-6, "loss {}", report.final_loss);

        let recon = model
            .inverse_transform(&model.transform(&x).unwrap())
            .unwrap();
        let err: f64 = x
            .iter()
            .zip(recon.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            / x.len() as f64;
        assert!(err < 1e-6, "reconstruction error {err}");
    }

    #[cfg(feature = "deep")]
    #[test]
    fn test_deep_training_reduces_loss() {
        let x = training_matrix(20, 16);
        let mut short = AutoencoderTransformer::new(AutoencoderConfig {
            max_iter: 1,
            tolerance: 0.0,
            ..small_config(2)
        });
        short.fit(&x).unwrap();
        let loss_short = short.fit_report().unwrap().final_loss;

        let mut long = AutoencoderTransformer::new(AutoencoderConfig {
            max_iter: 200,
            tolerance: 0.0,
            ..small_config(2)
        });
        long.fit(&x).unwrap();
        let loss_long = long.fit_report().unwrap().final_loss;

        assert!(
            loss_long < loss_short,
            "training did not reduce loss: {loss_short} -> {loss_long}"
        );
    }

    #[cfg(feature = "deep")]
    #[test]
    fn test_deep_fit_is_deterministic_for_a_seed() {
        let x = training_matrix(12, 10);
        let config = AutoencoderConfig {
            max_iter: 20,
            ..small_config(2)
        };

        let mut a = AutoencoderTransformer::new(config.clone());
        let mut b = AutoencoderTransformer::new(config);
        a.fit(&x).unwrap();
        b.fit(&x).unwrap();

        let la = a.transform(&x).unwrap();
        let lb = b.transform(&x).unwrap();
        assert_eq!(la, lb);
    }

    #[cfg(feature = "deep")]
    #[test]
    fn test_iteration_cap_reported_as_unconverged() {
        let x = training_matrix(12, 10);
        let mut model = AutoencoderTransformer::new(AutoencoderConfig {
            max_iter: 3,
            tolerance: 0.0,
            ..small_config(2)
        });
        model.fit(&x).unwrap();

        let report = model.fit_report().unwrap();
        assert_eq!(report.epochs_run, 3);
        assert!(!report.converged);
    }

    #[test]
    fn test_rejects_excessive_components() {
        let x = training_matrix(10, 6);
        let mut model = AutoencoderTransformer::new(small_config(7));
        assert!(matches!(
            model.fit(&x),
            Err(SpectralError::InvalidParameter { .. })
        ));
    }
}
