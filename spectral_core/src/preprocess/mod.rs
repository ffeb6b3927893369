//! Stateless signal-conditioning transforms.
//!
//! Every operation here is a pure function: deterministic, no hidden
//! state, identical output for identical input. Batch variants apply the
//! single-spectrum operation row-wise over a matrix; a single spectrum
//! behaves exactly like a one-row matrix. Because rows are independent,
//! implementations are free to process them in parallel without changing
//! observable behavior.

mod baseline;
mod correction;
mod denoise;
mod derivative;
mod normalize;
mod poly;
mod smoothing;
mod transforms;

pub use baseline::{asls_baseline, asls_baseline_batch, polynomial_baseline, BaselineFit};
pub use correction::bose_einstein;
pub use denoise::svd_denoise;
pub use derivative::{gradient, polynomial_fit, second_derivative};
pub use normalize::{normalize, normalize_batch, NormalizationMode};
pub use smoothing::{savgol, savgol_batch};
pub use transforms::{log_transform, sqrt_transform};

use ndarray::Array1;

/// Quality-control predicate: a spectrum passes when its maximum intensity
/// reaches `min_max_intensity`.
///
/// Callers decide what to do with rejects; the engine never drops data
/// silently.
pub fn passes_quality_check(y: &Array1<f64>, min_max_intensity: f64) -> bool {
    y.iter().cloned().fold(f64::NEG_INFINITY, f64::max) >= min_max_intensity
}
