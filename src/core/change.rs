//! Before/after change of the high-confidence water masks
//!
//! Masks hold 0 (no water) or 2 (water), so `after - before` is:
//! 2 = newly flooded, 0 = unchanged, -2 = water receded.

use crate::core::band_math::subtract;
use crate::core::confidence::HIGH_CONFIDENCE;
use crate::core::reclassify::{reclassify, RemapValue};
use crate::types::{FloodResult, Raster};
use serde::{Deserialize, Serialize};

/// Difference value of cells that were dry before and wet after
pub const NEWLY_FLOODED: f32 = HIGH_CONFIDENCE;

/// Difference value of cells that were wet before and dry after
pub const RECEDED: f32 = -HIGH_CONFIDENCE;

/// `after_mask - before_mask`
pub fn flood_difference(after_mask: &Raster, before_mask: &Raster) -> FloodResult<Raster> {
    subtract(after_mask, before_mask)
}

/// Null out everything but newly flooded cells (-2 and 0 become NoData)
pub fn newly_flooded(difference: &Raster) -> Raster {
    reclassify(
        difference,
        &RemapValue::default().nodata(RECEDED).nodata(0.0),
    )
}

/// Summary of the flood extent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodStats {
    /// Cells newly covered by water
    pub flooded_cells: usize,
    /// Flooded area in squared map units
    pub flooded_area: f64,
    /// Cells where water disappeared
    pub receded_cells: usize,
    /// Cells compared in both acquisitions
    pub compared_cells: usize,
}

impl FloodStats {
    pub fn from_difference(difference: &Raster) -> Self {
        let flooded_cells = difference.count_value(NEWLY_FLOODED);
        Self {
            flooded_cells,
            flooded_area: flooded_cells as f64 * difference.geo.transform.cell_area(),
            receded_cells: difference.count_value(RECEDED),
            compared_cells: difference.valid_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoReference, GeoTransform};
    use ndarray::array;

    #[test]
    fn test_newly_flooded_cells() {
        let geo = GeoReference {
            transform: GeoTransform::north_up(0.0, 20.0, 10.0, -10.0),
            projection: String::new(),
        };
        let before = Raster::new(array![[0.0, 2.0], [2.0, 0.0]], geo.clone());
        let after = Raster::new(array![[2.0, 2.0], [0.0, 0.0]], geo);

        let diff = flood_difference(&after, &before).unwrap();
        assert_eq!(diff.data, array![[2.0, 0.0], [-2.0, 0.0]]);

        let flooded = newly_flooded(&diff);
        assert_eq!(flooded.data[[0, 0]], 2.0);
        assert_eq!(flooded.valid_count(), 1);

        let stats = FloodStats::from_difference(&diff);
        assert_eq!(stats.flooded_cells, 1);
        assert_eq!(stats.receded_cells, 1);
        assert_eq!(stats.compared_cells, 4);
        assert_eq!(stats.flooded_area, 100.0);
    }
}
