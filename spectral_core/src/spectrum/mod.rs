//! Spectrum and spectrum-matrix data model.
//!
//! A [`Spectrum`] is an ordered sequence of intensity values aligned to a
//! shared wavenumber axis; a [`SpectrumMatrix`] stacks several spectra that
//! share one axis (rows = samples, columns = axis positions). Both are
//! immutable once constructed: every pipeline stage produces fresh arrays
//! instead of mutating in place.

mod resample;

pub use resample::{axes_match, resample_linear};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{SpectralError, SpectralResult};

/// Direction of a strictly monotonic wavenumber axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    Ascending,
    Descending,
}

/// Classifies a wavenumber axis, rejecting non-monotonic or too-short axes.
///
/// # Arguments
///
/// * `axis` - Candidate wavenumber axis
/// * `context` - Name of the caller for error messages
pub fn axis_order(axis: &Array1<f64>, context: &str) -> SpectralResult<AxisOrder> {
    if axis.len() < 2 {
        return Err(SpectralError::invalid_parameter(
            "axis",
            format!("{} points", axis.len()),
            "at least 2 axis positions",
        ));
    }

    let ascending = axis.windows(2).into_iter().all(|w| w[0] < w[1]);
    if ascending {
        return Ok(AxisOrder::Ascending);
    }

    let descending = axis.windows(2).into_iter().all(|w| w[0] > w[1]);
    if descending {
        return Ok(AxisOrder::Descending);
    }

    Err(SpectralError::non_monotonic_axis(context))
}

/// A single spectrum: intensities aligned to a strictly monotonic
/// wavenumber axis of identical length.
///
/// # Examples
///
/// ```
/// use ndarray::Array1;
/// use spectral_core::spectrum::Spectrum;
///
/// let axis = Array1::linspace(400.0, 1800.0, 701);
/// let y = axis.mapv(|w: f64| (-((w - 1000.0) / 25.0).powi(2)).exp());
/// let spectrum = Spectrum::new(axis, y).unwrap();
/// assert_eq!(spectrum.len(), 701);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    wavenumbers: Array1<f64>,
    intensities: Array1<f64>,
}

impl Spectrum {
    /// Creates a spectrum after validating axis monotonicity and lengths.
    pub fn new(wavenumbers: Array1<f64>, intensities: Array1<f64>) -> SpectralResult<Self> {
        axis_order(&wavenumbers, "spectrum")?;
        if wavenumbers.len() != intensities.len() {
            return Err(SpectralError::shape_mismatch(
                wavenumbers.len(),
                intensities.len(),
                "spectrum intensities",
            ));
        }
        Ok(Self {
            wavenumbers,
            intensities,
        })
    }

    /// Wavenumber axis.
    pub fn wavenumbers(&self) -> &Array1<f64> {
        &self.wavenumbers
    }

    /// Intensity values.
    pub fn intensities(&self) -> &Array1<f64> {
        &self.intensities
    }

    /// Number of axis positions.
    pub fn len(&self) -> usize {
        self.wavenumbers.len()
    }

    /// Whether the spectrum holds no points.
    pub fn is_empty(&self) -> bool {
        self.wavenumbers.is_empty()
    }

    /// Returns a copy of this spectrum resampled onto `target_axis`.
    ///
    /// Positions outside the source support are filled with 0.
    pub fn resampled_onto(&self, target_axis: &Array1<f64>) -> SpectralResult<Self> {
        axis_order(target_axis, "resample target")?;
        let y = resample_linear(&self.wavenumbers, &self.intensities, target_axis);
        Ok(Self {
            wavenumbers: target_axis.clone(),
            intensities: y,
        })
    }
}

/// A batch of spectra sharing a single wavenumber axis.
///
/// Rows are samples, columns are axis positions. The invariant that every
/// row shares the same axis is enforced at construction; callers combining
/// sources with different axes must resample first (see
/// [`resample_linear`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumMatrix {
    wavenumbers: Array1<f64>,
    intensities: Array2<f64>,
}

impl SpectrumMatrix {
    /// Creates a matrix after validating that the column count matches the
    /// axis length.
    pub fn new(wavenumbers: Array1<f64>, intensities: Array2<f64>) -> SpectralResult<Self> {
        axis_order(&wavenumbers, "spectrum matrix")?;
        if intensities.ncols() != wavenumbers.len() {
            return Err(SpectralError::shape_mismatch(
                wavenumbers.len(),
                intensities.ncols(),
                "spectrum matrix columns",
            ));
        }
        Ok(Self {
            wavenumbers,
            intensities,
        })
    }

    /// Stacks individual spectra into one matrix, resampling rows whose
    /// axis differs from `target_axis`.
    pub fn from_spectra(target_axis: Array1<f64>, spectra: &[Spectrum]) -> SpectralResult<Self> {
        axis_order(&target_axis, "spectrum matrix")?;
        if spectra.is_empty() {
            return Err(SpectralError::empty_input("spectra"));
        }

        let mut rows = Array2::zeros((spectra.len(), target_axis.len()));
        for (i, spectrum) in spectra.iter().enumerate() {
            let aligned = if axes_match(spectrum.wavenumbers(), &target_axis) {
                spectrum.intensities().clone()
            } else {
                resample_linear(spectrum.wavenumbers(), spectrum.intensities(), &target_axis)
            };
            rows.row_mut(i).assign(&aligned);
        }

        Self::new(target_axis, rows)
    }

    /// Shared wavenumber axis.
    pub fn wavenumbers(&self) -> &Array1<f64> {
        &self.wavenumbers
    }

    /// Intensity matrix (rows = samples).
    pub fn intensities(&self) -> &Array2<f64> {
        &self.intensities
    }

    /// Number of sample rows.
    pub fn n_samples(&self) -> usize {
        self.intensities.nrows()
    }

    /// Number of axis positions.
    pub fn n_points(&self) -> usize {
        self.intensities.ncols()
    }
}
