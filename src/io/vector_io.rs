//! Raster to polygon shapefile through GDAL's polygonizer

use crate::io::raster_io;
use crate::types::{FloodError, FloodResult, Raster};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess, LayerOptions};
use gdal::DriverManager;
use gdal_sys::{CPLErr, OGRFieldType, OGRwkbGeometryType};
use std::path::Path;

/// Attribute field holding the cell value of each polygon
pub const VALUE_FIELD: &str = "gridcode";
/// Attribute field holding the polygon area in squared map units
pub const AREA_FIELD: &str = "area";

const SHAPEFILE_SIDECARS: [&str; 6] = ["shp", "shx", "dbf", "prj", "cpg", "qix"];

/// Features written to a polygon shapefile
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolygonSummary {
    pub polygon_count: usize,
    /// Sum of the polygon areas in squared map units
    pub total_area: f64,
}

/// Remove a shapefile and its sidecar files if present
fn remove_shapefile(path: &Path) -> FloodResult<()> {
    for ext in SHAPEFILE_SIDECARS {
        let part = path.with_extension(ext);
        if part.exists() {
            log::debug!("Removing existing {}", part.display());
            std::fs::remove_file(&part)?;
        }
    }
    Ok(())
}

/// Polygonize an integer-valued raster (NaN = NoData) with `GDALPolygonize`.
/// Returns one (cell value, geometry) pair per 4-connected region.
fn polygonize_regions(raster: &Raster) -> FloodResult<Vec<(i32, Geometry)>> {
    let mem_raster = raster_io::mask_dataset("MEM", "", raster)?;
    let band = mem_raster.rasterband(1)?;

    let mut mem_vector = DriverManager::get_driver_by_name("Memory")?.create_vector_only("")?;
    let mut layer = mem_vector.create_layer(LayerOptions {
        name: "regions",
        ty: OGRwkbGeometryType::wkbPolygon,
        ..Default::default()
    })?;
    layer.create_defn_fields(&[(VALUE_FIELD, OGRFieldType::OFTInteger)])?;

    // The mask band of a band with NoData excludes NoData cells
    let rc = unsafe {
        let c_band = band.c_rasterband();
        gdal_sys::GDALPolygonize(
            c_band,
            gdal_sys::GDALGetMaskBand(c_band),
            layer.c_layer(),
            0,
            std::ptr::null_mut(),
            None,
            std::ptr::null_mut(),
        )
    };
    if rc != CPLErr::CE_None {
        return Err(FloodError::Processing(format!(
            "GDALPolygonize failed with code {}",
            rc
        )));
    }

    let mut regions = Vec::new();
    for feature in layer.features() {
        let value = match feature.field(VALUE_FIELD)? {
            Some(FieldValue::IntegerValue(v)) => v,
            other => {
                return Err(FloodError::Processing(format!(
                    "Polygonized feature without integer value: {:?}",
                    other
                )))
            }
        };
        if let Some(geometry) = feature.geometry() {
            regions.push((value, geometry.clone()));
        }
    }
    Ok(regions)
}

/// Polygonize `raster` into an ESRI Shapefile in the raster's projection.
///
/// Each 4-connected region of equal value becomes one feature, boundaries
/// unsimplified. `gridcode` holds the cell value and `area` the area of the
/// polygon geometry. An existing shapefile of the same name is replaced.
pub fn polygonize_to_shapefile<P: AsRef<Path>>(
    raster: &Raster,
    output_path: P,
) -> FloodResult<PolygonSummary> {
    let output_path = output_path.as_ref();
    log::info!("Converting raster to polygons: {}", output_path.display());

    let regions = polygonize_regions(raster)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    remove_shapefile(output_path)?;

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")?;
    let mut dataset = driver.create_vector_only(output_path)?;

    let srs = if raster.geo.projection.is_empty() {
        None
    } else {
        Some(SpatialRef::from_wkt(&raster.geo.projection)?)
    };
    let layer_name = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("polygons")
        .to_string();

    let mut layer = dataset.create_layer(LayerOptions {
        name: &layer_name,
        srs: srs.as_ref(),
        ty: OGRwkbGeometryType::wkbPolygon,
        ..Default::default()
    })?;
    layer.create_defn_fields(&[
        (VALUE_FIELD, OGRFieldType::OFTInteger),
        (AREA_FIELD, OGRFieldType::OFTReal),
    ])?;

    let mut summary = PolygonSummary::default();
    for (value, geometry) in regions {
        let area = geometry.area();
        layer.create_feature_fields(
            geometry,
            &[VALUE_FIELD, AREA_FIELD],
            &[FieldValue::IntegerValue(value), FieldValue::RealValue(area)],
        )?;
        summary.polygon_count += 1;
        summary.total_area += area;
    }

    log::info!(
        "Saved {} polygons ({:.1} map units²)",
        summary.polygon_count,
        summary.total_area
    );
    Ok(summary)
}
