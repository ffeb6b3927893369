//! Linear resampling between wavenumber axes.

use ndarray::Array1;

/// Relative tolerance used when deciding whether two axes are identical.
const AXIS_MATCH_RTOL: f64 = 1e-9;

/// Returns true when two axes have the same length and matching positions
/// within a small relative tolerance.
pub fn axes_match(a: &Array1<f64>, b: &Array1<f64>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .all(|(&x, &y)| (x - y).abs() <= AXIS_MATCH_RTOL * x.abs().max(y.abs()).max(1.0))
}

/// Resamples `src_y` (sampled at `src_axis`) onto `dst_axis` by linear
/// interpolation.
///
/// Destination positions outside the source support are filled with 0,
/// matching the loader contract for library spectra. Both axes may be
/// ascending or descending; the source is normalized to ascending order
/// internally.
///
/// # Arguments
///
/// * `src_axis` - Source wavenumber positions (strictly monotonic)
/// * `src_y` - Source intensities, same length as `src_axis`
/// * `dst_axis` - Target wavenumber positions
///
/// # Returns
///
/// Intensities aligned to `dst_axis`
pub fn resample_linear(
    src_axis: &Array1<f64>,
    src_y: &Array1<f64>,
    dst_axis: &Array1<f64>,
) -> Array1<f64> {
    debug_assert_eq!(src_axis.len(), src_y.len());

    // Normalize the source to ascending order so interpolation can walk it.
    let descending = src_axis.len() >= 2 && src_axis[0] > src_axis[src_axis.len() - 1];
    let (xs, ys): (Vec<f64>, Vec<f64>) = if descending {
        (
            src_axis.iter().rev().copied().collect(),
            src_y.iter().rev().copied().collect(),
        )
    } else {
        (src_axis.to_vec(), src_y.to_vec())
    };

    dst_axis.mapv(|x| interpolate_at(&xs, &ys, x))
}

fn interpolate_at(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    if x < xs[0] || x > xs[n - 1] {
        return 0.0;
    }

    // Binary search for the bracketing interval.
    let idx = xs.partition_point(|&v| v <= x);
    if idx == 0 {
        return ys[0];
    }
    if idx >= n {
        return ys[n - 1];
    }

    let (x0, x1) = (xs[idx - 1], xs[idx]);
    let (y0, y1) = (ys[idx - 1], ys[idx]);
    let span = x1 - x0;
    if span == 0.0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / span
}
