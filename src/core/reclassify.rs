use crate::types::Raster;

/// Tolerance for exact-value matches on float cells
const VALUE_TOLERANCE: f32 = 1e-6;

/// Output of a remap entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemapTarget {
    Value(f32),
    NoData,
}

/// Exact-value remap table. Values without an entry keep their value.
#[derive(Debug, Clone, Default)]
pub struct RemapValue {
    entries: Vec<(f32, RemapTarget)>,
}

impl RemapValue {
    pub fn new(entries: Vec<(f32, RemapTarget)>) -> Self {
        Self { entries }
    }

    /// Remap `from` to `to`
    pub fn value(mut self, from: f32, to: f32) -> Self {
        self.entries.push((from, RemapTarget::Value(to)));
        self
    }

    /// Remap `from` to NoData
    pub fn nodata(mut self, from: f32) -> Self {
        self.entries.push((from, RemapTarget::NoData));
        self
    }

    fn apply(&self, v: f32) -> f32 {
        if v.is_nan() {
            return f32::NAN;
        }
        match self
            .entries
            .iter()
            .find(|(from, _)| (v - from).abs() <= VALUE_TOLERANCE)
        {
            Some((_, RemapTarget::Value(to))) => *to,
            Some((_, RemapTarget::NoData)) => f32::NAN,
            None => v,
        }
    }
}

/// Reclassify raster values through a remap table
pub fn reclassify(raster: &Raster, remap: &RemapValue) -> Raster {
    log::debug!("Reclassifying with {} remap entries", remap.entries.len());
    raster.with_data(raster.data.mapv(|v| remap.apply(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoReference;
    use ndarray::array;

    #[test]
    fn test_remap_values_and_nodata() {
        let raster = Raster::new(array![[-2.0, 0.0, 2.0, f32::NAN]], GeoReference::default());
        let remap = RemapValue::default().nodata(-2.0).value(0.0, 5.0);
        let out = reclassify(&raster, &remap);

        assert!(out.data[[0, 0]].is_nan());
        assert_eq!(out.data[[0, 1]], 5.0);
        // Unlisted values pass through
        assert_eq!(out.data[[0, 2]], 2.0);
        assert!(out.data[[0, 3]].is_nan());
    }
}
