use crate::core::grid::align_all;
use crate::types::{FloodResult, Raster};
use ndarray::Zip;

/// Apply `op` cell by cell to two rasters.
///
/// Inputs are aligned to their common grid first, so the output may be coarser
/// than either input. NaN handling is left to `op`.
pub fn combine<F>(a: &Raster, b: &Raster, op: F) -> FloodResult<Raster>
where
    F: Fn(f32, f32) -> f32 + Sync + Send,
{
    let aligned = align_all(&[a, b])?;
    let (lhs, rhs) = (&aligned[0], &aligned[1]);

    #[cfg(feature = "parallel")]
    let data = Zip::from(&lhs.data)
        .and(&rhs.data)
        .par_map_collect(|&x, &y| op(x, y));

    #[cfg(not(feature = "parallel"))]
    let data = Zip::from(&lhs.data)
        .and(&rhs.data)
        .map_collect(|&x, &y| op(x, y));

    Ok(lhs.with_data(data))
}

/// Cell-wise sum, NaN if either input is NaN
pub fn add(a: &Raster, b: &Raster) -> FloodResult<Raster> {
    combine(a, b, |x, y| x + y)
}

/// Cell-wise difference `a - b`, NaN if either input is NaN
pub fn subtract(a: &Raster, b: &Raster) -> FloodResult<Raster> {
    combine(a, b, |x, y| x - y)
}
