//! Cosine-similarity matching against a named reference library.
//!
//! Library entries are resampled onto the matcher's axis when added and
//! immutable afterwards. Matching is a linear scan; reference libraries
//! here are hundreds of entries, not millions.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{SpectralError, SpectralResult};
use crate::spectrum::{axes_match, axis_order, resample_linear};

/// One scored match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Library entry name.
    pub name: String,
    /// Cosine similarity in [-1, 1]; 0 for degenerate (zero-norm) pairs.
    pub score: f64,
}

struct LibraryEntry {
    name: String,
    intensities: Array1<f64>,
}

/// Nearest-neighbor matcher over a named reference library.
pub struct SpectralMatcher {
    wavenumbers: Array1<f64>,
    entries: Vec<LibraryEntry>,
}

impl SpectralMatcher {
    /// Creates a matcher whose library lives on the given axis.
    pub fn new(wavenumbers: Array1<f64>) -> SpectralResult<Self> {
        axis_order(&wavenumbers, "matcher axis")?;
        Ok(Self {
            wavenumbers,
            entries: Vec::new(),
        })
    }

    /// Adds a named reference spectrum, resampling it onto the library
    /// axis when the source axis differs. Insertion order is preserved and
    /// breaks score ties.
    pub fn add_reference(
        &mut self,
        name: &str,
        axis: &Array1<f64>,
        intensities: &Array1<f64>,
    ) -> SpectralResult<()> {
        axis_order(axis, "reference axis")?;
        if axis.len() != intensities.len() {
            return Err(SpectralError::shape_mismatch(
                axis.len(),
                intensities.len(),
                "reference intensities",
            ));
        }

        let aligned = if axes_match(axis, &self.wavenumbers) {
            intensities.clone()
        } else {
            resample_linear(axis, intensities, &self.wavenumbers)
        };
        self.entries.push(LibraryEntry {
            name: name.to_string(),
            intensities: aligned,
        });
        Ok(())
    }

    /// Number of library entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches a query spectrum against the library.
    ///
    /// The query is resampled onto the library axis when its axis
    /// differs. Results are the `top_k` entries by descending cosine
    /// similarity; ties keep library insertion order (stable sort). A
    /// zero-norm query scores 0 against every entry; cosine similarity is
    /// undefined there, and the documented policy is the fallback value,
    /// not an error.
    ///
    /// # Arguments
    ///
    /// * `query_axis` - Wavenumber axis of the query
    /// * `query` - Query intensities, same length as `query_axis`
    /// * `top_k` - Maximum number of results
    pub fn match_spectrum(
        &self,
        query_axis: &Array1<f64>,
        query: &Array1<f64>,
        top_k: usize,
    ) -> SpectralResult<Vec<MatchResult>> {
        axis_order(query_axis, "query axis")?;
        if query_axis.len() != query.len() {
            return Err(SpectralError::shape_mismatch(
                query_axis.len(),
                query.len(),
                "query intensities",
            ));
        }
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let aligned = if axes_match(query_axis, &self.wavenumbers) {
            query.clone()
        } else {
            resample_linear(query_axis, query, &self.wavenumbers)
        };

        let query_norm = norm(&aligned);
        if query_norm == 0.0 {
            tracing::warn!(
                "zero-norm query spectrum; assigning similarity 0 to every library entry"
            );
        }

        let mut scored: Vec<MatchResult> = self
            .entries
            .iter()
            .map(|entry| MatchResult {
                name: entry.name.clone(),
                score: cosine_similarity(&aligned, query_norm, &entry.intensities),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn norm(y: &Array1<f64>) -> f64 {
    y.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn cosine_similarity(query: &Array1<f64>, query_norm: f64, entry: &Array1<f64>) -> f64 {
    let entry_norm = norm(entry);
    if query_norm == 0.0 || entry_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = query.iter().zip(entry.iter()).map(|(a, b)| a * b).sum();
    dot / (query_norm * entry_norm)
}
