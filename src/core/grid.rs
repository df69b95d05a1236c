//! Grid alignment for band algebra between rasters of different resolution
//!
//! Sentinel-2 delivers B05/B12 at 20 m and B03/B08 at 10 m. Cell-wise operations
//! run on the coarsest cell size of their inputs over the overlap of their extents.

use crate::types::{Extent, FloodError, FloodResult, GeoReference, GeoTransform, Raster};
use ndarray::Array2;

/// Relative tolerance used when comparing grid geometry
const GRID_TOLERANCE: f64 = 1e-6;

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= GRID_TOLERANCE * scale.abs().max(1.0)
}

fn same_transform(ta: &GeoTransform, tb: &GeoTransform) -> bool {
    let scale = ta.pixel_width;
    close(ta.top_left_x, tb.top_left_x, scale)
        && close(ta.top_left_y, tb.top_left_y, scale)
        && close(ta.pixel_width, tb.pixel_width, scale)
        && close(ta.pixel_height, tb.pixel_height, scale)
        && close(ta.rotation_x, tb.rotation_x, scale)
        && close(ta.rotation_y, tb.rotation_y, scale)
}

/// Whether two rasters share cell size, origin and shape
pub fn same_grid(a: &Raster, b: &Raster) -> bool {
    a.dim() == b.dim() && same_transform(&a.geo.transform, &b.geo.transform)
}

/// Output grid for a cell-wise operation over `rasters`: the coarsest cell size
/// over the intersection of all extents.
pub fn common_grid(rasters: &[&Raster]) -> FloodResult<(GeoReference, (usize, usize))> {
    let first = rasters
        .first()
        .ok_or_else(|| FloodError::InvalidParameter("No rasters to align".to_string()))?;

    if rasters.iter().all(|r| same_grid(first, r)) {
        return Ok((first.geo.clone(), first.dim()));
    }

    if rasters.iter().any(|r| r.geo.transform.is_rotated()) {
        return Err(FloodError::GridMismatch(
            "Rotated grids cannot be aligned".to_string(),
        ));
    }

    for r in rasters.iter().skip(1) {
        if !r.geo.projection.is_empty()
            && !first.geo.projection.is_empty()
            && r.geo.projection != first.geo.projection
        {
            log::warn!("Input rasters carry different projections; using the first one");
        }
    }

    let mut extent: Extent = first.extent();
    let mut cell_x: f64 = 0.0;
    let mut cell_y: f64 = 0.0;
    for r in rasters {
        extent = extent.intersection(&r.extent()).ok_or_else(|| {
            FloodError::GridMismatch("Input rasters do not overlap".to_string())
        })?;
        cell_x = cell_x.max(r.geo.transform.pixel_width.abs());
        cell_y = cell_y.max(r.geo.transform.pixel_height.abs());
    }

    let cols = ((extent.max_x - extent.min_x) / cell_x + GRID_TOLERANCE).floor() as usize;
    let rows = ((extent.max_y - extent.min_y) / cell_y + GRID_TOLERANCE).floor() as usize;
    if rows == 0 || cols == 0 {
        return Err(FloodError::GridMismatch(format!(
            "Overlap is smaller than one {}x{} cell",
            cell_x, cell_y
        )));
    }

    let north_up = first.geo.transform.pixel_height < 0.0;
    let (top_y, pixel_height) = if north_up {
        (extent.max_y, -cell_y)
    } else {
        (extent.min_y, cell_y)
    };

    let geo = GeoReference {
        transform: GeoTransform::north_up(extent.min_x, top_y, cell_x, pixel_height),
        projection: first.geo.projection.clone(),
    };
    log::debug!(
        "Common grid: {}x{} cells of {}x{} at ({}, {})",
        rows,
        cols,
        cell_x,
        cell_y,
        extent.min_x,
        top_y
    );
    Ok((geo, (rows, cols)))
}

/// Nearest-neighbour resample of `source` onto a target grid.
/// Target cells whose centre falls outside the source are NaN.
pub fn align_to(source: &Raster, target: &GeoReference, shape: (usize, usize)) -> Raster {
    let (src_rows, src_cols) = source.dim();
    if shape == (src_rows, src_cols) && same_transform(&source.geo.transform, &target.transform) {
        return Raster::new(source.data.clone(), target.clone());
    }

    let src_gt = &source.geo.transform;
    let data = Array2::from_shape_fn(shape, |(row, col)| {
        let (x, y) = target
            .transform
            .pixel_to_map(col as f64 + 0.5, row as f64 + 0.5);
        let (src_col, src_row) = src_gt.map_to_pixel(x, y);
        if src_col < 0.0 || src_row < 0.0 {
            return f32::NAN;
        }
        let (c, r) = (src_col.floor() as usize, src_row.floor() as usize);
        if r < src_rows && c < src_cols {
            source.data[[r, c]]
        } else {
            f32::NAN
        }
    });
    Raster::new(data, target.clone())
}

/// Bring all rasters onto their common grid
pub fn align_all(rasters: &[&Raster]) -> FloodResult<Vec<Raster>> {
    let (geo, shape) = common_grid(rasters)?;
    Ok(rasters.iter().map(|r| align_to(r, &geo, shape)).collect())
}
