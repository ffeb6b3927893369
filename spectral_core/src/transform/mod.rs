//! Stateful fit/transform models.
//!
//! Everything here implements one capability set: [`Transformer`], with
//! `fit`, `transform` and `inverse_transform`. A fitted model's
//! `transform`/`inverse_transform` read only immutable learned parameters
//! and may be shared across threads; `fit` takes `&mut self`, so the
//! borrow checker rules out concurrent fitting of one instance.

mod autoencoder;
mod background;
mod nonneg;

pub use autoencoder::{
    AutoencoderBackend, AutoencoderConfig, AutoencoderTransformer, FitReport,
};
pub use background::{AdaptiveBackgroundFilter, BackgroundFilterConfig};
pub use nonneg::NonNegativeTransformer;

use ndarray::Array2;

use crate::error::SpectralResult;

/// The fit/transform capability set shared by all models.
pub trait Transformer {
    /// Learns model state from the sample matrix (rows = spectra).
    fn fit(&mut self, x: &Array2<f64>) -> SpectralResult<()>;

    /// Maps samples through the fitted model.
    ///
    /// Calling this before [`Transformer::fit`] returns the not-fitted
    /// error for models that require fitting.
    fn transform(&self, x: &Array2<f64>) -> SpectralResult<Array2<f64>>;

    /// Maps transformed samples back toward the original space. Whether
    /// the round trip is exact is model-specific and documented per model.
    fn inverse_transform(&self, h: &Array2<f64>) -> SpectralResult<Array2<f64>>;
}
