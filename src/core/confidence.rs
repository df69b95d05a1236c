use crate::core::band_math::add;
use crate::core::reclassify::{reclassify, RemapValue};
use crate::types::{FloodResult, Raster};

/// Confidence value where both indices flag water
pub const HIGH_CONFIDENCE: f32 = 2.0;

/// Sum of the NDWI and SWI binary masks (0, 1 or 2). NaN where either mask is NaN.
pub fn water_confidence(ndwi_mask: &Raster, swi_mask: &Raster) -> FloodResult<Raster> {
    let confidence = add(ndwi_mask, swi_mask)?;
    log::debug!(
        "Water confidence: {} cells at 2, {} at 1, {} at 0",
        confidence.count_value(2.0),
        confidence.count_value(1.0),
        confidence.count_value(0.0)
    );
    Ok(confidence)
}

/// Keep only cells where both indices agree: confidence 1 becomes 0
pub fn high_confidence_water(confidence: &Raster) -> Raster {
    reclassify(confidence, &RemapValue::default().value(1.0, 0.0))
}
