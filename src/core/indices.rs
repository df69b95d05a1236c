//! Spectral water indices
//!
//! Both indices are normalized differences of two reflectance bands and fall
//! in [-1, 1]. Open water scores high on both.

use crate::core::band_math::combine;
use crate::types::{FloodResult, Raster};

/// `(a - b) / (a + b)` for one cell; NaN when a zero denominator or NaN input
#[inline]
pub fn normalized_difference_value(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        return f32::NAN;
    }
    let denominator = a + b;
    if denominator == 0.0 {
        f32::NAN
    } else {
        (a - b) / denominator
    }
}

/// Normalized difference `(a - b) / (a + b)` of two rasters
pub fn normalized_difference(a: &Raster, b: &Raster) -> FloodResult<Raster> {
    combine(a, b, normalized_difference_value)
}

/// Sentinel-2 Water Index: (RedEdge1 - SWIR2) / (RedEdge1 + SWIR2)
pub fn swi(red_edge1: &Raster, swir2: &Raster) -> FloodResult<Raster> {
    log::info!("Beginning SWI calculation...");
    let index = normalized_difference(red_edge1, swir2)?;
    log::info!("SWI successfully generated");
    Ok(index)
}

/// Normalized Difference Water Index: (Green - NIR) / (Green + NIR)
pub fn ndwi(green: &Raster, nir: &Raster) -> FloodResult<Raster> {
    log::info!("Beginning NDWI calculation...");
    let index = normalized_difference(green, nir)?;
    log::info!("NDWI successfully generated");
    Ok(index)
}
