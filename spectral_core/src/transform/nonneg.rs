//! Non-negativity projection.

use ndarray::Array2;

use crate::error::SpectralResult;
use crate::transform::Transformer;

/// Projects spectra onto the non-negative orthant by clipping negative
/// values to zero.
///
/// `fit` is a no-op; the projector carries no learned state.
/// `inverse_transform` is the identity and is explicitly lossy: whatever
/// mass the projection clipped cannot be recovered, so
/// `inverse_transform(transform(x))` equals `transform(x)`, not `x`.
#[derive(Debug, Clone, Default)]
pub struct NonNegativeTransformer;

impl NonNegativeTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for NonNegativeTransformer {
    fn fit(&mut self, _x: &Array2<f64>) -> SpectralResult<()> {
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> SpectralResult<Array2<f64>> {
        Ok(x.mapv(|v| v.max(0.0)))
    }

    fn inverse_transform(&self, h: &Array2<f64>) -> SpectralResult<Array2<f64>> {
        Ok(h.clone())
    }
}
