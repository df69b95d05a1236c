use crate::types::{FloodError, FloodResult, Raster};
use serde::{Deserialize, Serialize};

/// Otsu thresholding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Number of histogram bins spanning [min, max] of the valid cells
    pub bins: usize,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { bins: 256 }
    }
}

/// Otsu split of the valid cells
enum Split {
    /// Cells at or above this value form the upper class
    At(f32),
    /// No variance: every valid cell holds this value
    Constant(f32),
}

fn otsu_split(raster: &Raster, bins: usize) -> FloodResult<Split> {
    if bins < 2 {
        return Err(FloodError::InvalidParameter(format!(
            "Otsu thresholding needs at least 2 bins, got {}",
            bins
        )));
    }

    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    let mut count = 0usize;
    for &v in raster.data.iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        count += 1;
    }
    if count == 0 {
        return Err(FloodError::EmptyRaster(
            "cannot threshold a raster without valid cells".to_string(),
        ));
    }
    if max_v - min_v <= f32::EPSILON {
        log::warn!("Constant raster ({}), threshold leaves every cell unset", min_v);
        return Ok(Split::Constant(min_v));
    }

    let range = (max_v - min_v) as f64;
    let width = range / bins as f64;
    let mut hist = vec![0u64; bins];
    for &v in raster.data.iter().filter(|v| v.is_finite()) {
        let idx = (((v - min_v) as f64 / range) * bins as f64) as usize;
        hist[idx.min(bins - 1)] += 1;
    }

    let total = count as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 0usize;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }
        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if between > best_var {
            best_var = between;
            best_t = t;
        }
    }

    let threshold = (min_v as f64 + (best_t + 1) as f64 * width) as f32;
    log::debug!(
        "Otsu threshold {:.6} (bin {} of {}, range [{:.6}, {:.6}], {} cells)",
        threshold,
        best_t,
        bins,
        min_v,
        max_v,
        count
    );
    Ok(Split::At(threshold))
}

/// Otsu threshold of the valid (non-NaN) cells of a raster.
///
/// Returns the upper edge of the histogram bin that maximises the between-class
/// variance; cells on that edge were histogrammed into the upper class.
/// A constant raster returns its value.
pub fn otsu_threshold(raster: &Raster, bins: usize) -> FloodResult<f32> {
    Ok(match otsu_split(raster, bins)? {
        Split::At(t) | Split::Constant(t) => t,
    })
}

/// Binary mask: 1 where value >= threshold, 0 elsewhere; NaN stays NaN
pub fn binarize(raster: &Raster, threshold: f32) -> Raster {
    raster.with_data(raster.data.mapv(|v| {
        if v.is_nan() {
            f32::NAN
        } else if v >= threshold {
            1.0
        } else {
            0.0
        }
    }))
}

/// Otsu-threshold a raster into a binary mask. Returns the mask and the threshold.
/// A constant raster has no upper class, so its mask is all 0.
pub fn threshold_raster(raster: &Raster, params: &ThresholdParams) -> FloodResult<(Raster, f32)> {
    match otsu_split(raster, params.bins)? {
        Split::At(t) => Ok((binarize(raster, t), t)),
        Split::Constant(t) => Ok((
            raster.with_data(raster.data.mapv(|v| if v.is_nan() { f32::NAN } else { 0.0 })),
            t,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoReference;
    use ndarray::{array, Array2};

    fn grid(data: Array2<f32>) -> Raster {
        Raster::new(data, GeoReference::default())
    }

    #[test]
    fn test_bimodal_split() {
        // Land around -0.4, water around 0.6
        let data = Array2::from_shape_fn((10, 10), |(r, c)| {
            let jitter = ((r * 10 + c) % 5) as f32 * 0.01;
            if c < 6 { -0.4 + jitter } else { 0.6 - jitter }
        });
        let raster = grid(data);
        let t = otsu_threshold(&raster, 256).unwrap();
        assert!(t > -0.36 && t < 0.56, "threshold {} not between the modes", t);

        let mask = binarize(&raster, t);
        assert_eq!(mask.count_value(1.0), 40);
        assert_eq!(mask.count_value(0.0), 60);
    }

    #[test]
    fn test_nan_cells_are_ignored_and_kept() {
        let raster = grid(array![[0.0, 0.0, f32::NAN], [1.0, 1.0, f32::NAN]]);
        let (mask, t) = threshold_raster(&raster, &ThresholdParams::default()).unwrap();
        assert!(t > 0.0 && t < 1.0);
        assert_eq!(mask.data[[0, 0]], 0.0);
        assert_eq!(mask.data[[1, 1]], 1.0);
        assert!(mask.data[[0, 2]].is_nan());
    }

    #[test]
    fn test_constant_raster_has_no_water() {
        let raster = grid(Array2::from_elem((3, 3), 0.25));
        let (mask, t) = threshold_raster(&raster, &ThresholdParams::default()).unwrap();
        assert_eq!(t, 0.25);
        assert_eq!(mask.count_value(0.0), 9);
    }

    #[test]
    fn test_empty_and_bad_params() {
        let raster = grid(Array2::from_elem((2, 2), f32::NAN));
        assert!(matches!(otsu_threshold(&raster, 256), Err(FloodError::EmptyRaster(_))));
        let ok = grid(array![[0.0, 1.0]]);
        assert!(matches!(otsu_threshold(&ok, 1), Err(FloodError::InvalidParameter(_))));
    }

    #[test]
    fn test_value_on_bin_edge_joins_upper_class() {
        // 0.5 is histogrammed into the upper bin, and the threshold is that bin's lower edge
        let raster = grid(array![[0.0, 0.5, 1.0]]);
        let t = otsu_threshold(&raster, 2).unwrap();
        assert_eq!(t, 0.5);

        let (mask, _) = threshold_raster(&raster, &ThresholdParams { bins: 2 }).unwrap();
        assert_eq!(mask.data, array![[0.0, 1.0, 1.0]]);
    }
}
