#![cfg(feature = "gdal")]

use approx::assert_abs_diff_eq;
use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use ndarray::Array2;
use s2flood::core::composite::false_color_composite;
use s2flood::io::{raster_io, vector_io};
use s2flood::types::{GeoReference, GeoTransform, Raster, Sentinel2Band};
use s2flood::core::polygonize;
use s2flood::{run_flood_analysis, FloodAnalysisParams, FloodReport};
use std::path::Path;
use tempfile::TempDir;

const UTM_15N: &str = r#"PROJCS["WGS 84 / UTM zone 15N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",-93],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1],AUTHORITY["EPSG","32615"]]"#;

fn georef(cell: f64) -> GeoReference {
    GeoReference {
        transform: GeoTransform::north_up(300000.0, 3300000.0, cell, -cell),
        projection: UTM_15N.to_string(),
    }
}

#[test]
fn test_geotiff_roundtrip_keeps_nodata_and_georeference() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("swi.tif");

    let mut data = Array2::from_shape_fn((4, 5), |(r, c)| r as f32 * 0.1 - c as f32 * 0.05);
    data[[2, 3]] = f32::NAN;
    let raster = Raster::new(data.clone(), georef(10.0));

    raster_io::write_geotiff(&raster, &path).expect("Failed to write GeoTIFF");
    let back = raster_io::read_band(&path).expect("Failed to read GeoTIFF");

    assert_eq!(back.dim(), (4, 5));
    assert_eq!(back.geo.transform, raster.geo.transform);
    assert!(back.geo.projection.contains("UTM zone 15N"));
    assert!(back.data[[2, 3]].is_nan());
    assert!((back.data[[3, 1]] - data[[3, 1]]).abs() < 1e-6);
}

#[test]
fn test_mask_geotiff_uses_byte_nodata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mask.tif");
    let mask = Raster::new(
        ndarray::array![[0.0, 2.0], [f32::NAN, 1.0]],
        georef(20.0),
    );

    raster_io::write_mask_geotiff(&mask, &path).unwrap();
    let dataset = Dataset::open(&path).unwrap();
    let band = dataset.rasterband(1).unwrap();
    assert_eq!(band.no_data_value(), Some(raster_io::MASK_NODATA as f64));

    let back = raster_io::read_band(&path).unwrap();
    assert_eq!(back.data[[0, 1]], 2.0);
    assert!(back.data[[1, 0]].is_nan());

    let negative = Raster::new(ndarray::array![[-2.0]], georef(20.0));
    assert!(raster_io::write_mask_geotiff(&negative, dir.path().join("bad.tif")).is_err());
}

#[test]
fn test_composite_has_three_bands() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("composite.tif");
    let band = |v: f32| Raster::new(Array2::from_elem((3, 3), v), georef(10.0));
    let composite = false_color_composite(&band(3000.0), &band(700.0), &band(800.0)).unwrap();

    raster_io::write_composite(&composite, &path).unwrap();
    let dataset = Dataset::open(&path).unwrap();
    assert_eq!(dataset.raster_count(), 3);
}

#[test]
fn test_polygon_shapefile_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flood.shp");
    let mut data = Array2::from_elem((4, 4), f32::NAN);
    data[[1, 1]] = 2.0;
    data[[1, 2]] = 2.0;
    data[[3, 3]] = 2.0;
    let raster = Raster::new(data, georef(10.0));

    vector_io::polygonize_to_shapefile(&raster, &path).unwrap();
    // Second write replaces the first
    let summary = vector_io::polygonize_to_shapefile(&raster, &path).unwrap();
    assert_eq!(summary.polygon_count, 2);
    assert_abs_diff_eq!(summary.total_area, 300.0, epsilon = 1e-6);
    // Same regions as the in-memory tracer
    assert_eq!(polygonize(&raster).unwrap().len(), summary.polygon_count);

    let dataset = Dataset::open(&path).unwrap();
    let mut layer = dataset.layer(0).unwrap();
    assert!(layer.spatial_ref().is_some());
    assert_eq!(layer.feature_count(), 2);
    let mut areas: Vec<f64> = layer
        .features()
        .map(|f| {
            match f.field(vector_io::VALUE_FIELD).unwrap() {
                Some(FieldValue::IntegerValue(v)) => assert_eq!(v, 2),
                other => panic!("unexpected gridcode {:?}", other),
            }
            match f.field(vector_io::AREA_FIELD).unwrap() {
                Some(FieldValue::RealValue(a)) => a,
                other => panic!("unexpected area {:?}", other),
            }
        })
        .collect();
    areas.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(areas.len(), 2);
    assert_abs_diff_eq!(areas[0], 100.0, epsilon = 1e-6);
    assert_abs_diff_eq!(areas[1], 200.0, epsilon = 1e-6);
}

#[test]
fn test_polygons_keep_values_apart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("classes.shp");
    let data = ndarray::array![
        [0.0, 0.0, 2.0],
        [0.0, 2.0, 2.0],
        [f32::NAN, 2.0, 2.0],
    ];
    let raster = Raster::new(data, georef(20.0));
    let summary = vector_io::polygonize_to_shapefile(&raster, &path).unwrap();
    assert_eq!(summary.polygon_count, 2);
    assert_abs_diff_eq!(summary.total_area, 8.0 * 400.0, epsilon = 1e-6);
}

/// Write one acquisition as GeoTIFF band files named like Sentinel-2 granules
fn write_scene(dir: &Path, water: impl Fn(usize, usize) -> bool) {
    for band in Sentinel2Band::ALL {
        let data = Array2::from_shape_fn((12, 12), |(r, c)| {
            let wet = water(r, c);
            match band {
                Sentinel2Band::Green => if wet { 1200.0 } else { 800.0 },
                Sentinel2Band::Nir => if wet { 300.0 } else { 3000.0 },
                Sentinel2Band::RedEdge1 => if wet { 900.0 } else { 1500.0 },
                Sentinel2Band::Swir2 => if wet { 100.0 } else { 2500.0 },
                _ => 700.0,
            }
        });
        let path = dir.join(format!("T15RTP_20170823T164849_{}.tif", band.suffix()));
        raster_io::write_geotiff(&Raster::new(data, georef(10.0)), path).unwrap();
    }
}

#[test]
fn test_run_flood_analysis_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = TempDir::new().unwrap();
    let before = root.path().join("Before");
    let after = root.path().join("After");
    let output = root.path().join("Output");
    std::fs::create_dir_all(&before).unwrap();
    std::fs::create_dir_all(&after).unwrap();

    write_scene(&before, |_, c| c < 3);
    write_scene(&after, |r, c| c < 3 || (r < 6 && c < 8));

    let params = FloodAnalysisParams {
        extension: "tif".to_string(),
        keep_intermediates: true,
        ..FloodAnalysisParams::default()
    };
    let report = run_flood_analysis(&before, &after, &output, &params).unwrap();

    assert_eq!(report.stats.flooded_cells, 30);
    assert_eq!(report.stats.flooded_area, 3000.0);
    assert_eq!(report.polygon_count, 1);
    assert!(report.raster_path.ends_with("Flooded_Area_Final_Raster.tif"));
    assert!(report.polygon_path.exists());
    assert!(output.join("intermediate/after_water_mask_high_confidence.tif").exists());
    assert!(output.join("intermediate/before_composite_img.tif").exists());
    assert!(output.join("intermediate/flooded_area_calc.tif").exists());

    let flooded = raster_io::read_band(&report.raster_path).unwrap();
    assert_eq!(flooded.count_value(2.0), 30);
    assert_eq!(flooded.valid_count(), 30);
    assert_abs_diff_eq!(report.polygon_area, 3000.0, epsilon = 1e-6);

    assert!(report.report_path.ends_with("flood_report.json"));
    let saved = FloodReport::load(&report.report_path).unwrap();
    assert_eq!(saved.stats, report.stats);
    assert_eq!(saved.generated_at, report.generated_at);
    assert_eq!(saved.params.extension, "tif");
    assert_eq!(saved.after.water_cells, 66);
}

#[test]
fn test_run_without_new_flooding_writes_empty_outputs() {
    let root = TempDir::new().unwrap();
    let before = root.path().join("Before");
    let after = root.path().join("After");
    let output = root.path().join("Output");
    std::fs::create_dir_all(&before).unwrap();
    std::fs::create_dir_all(&after).unwrap();

    write_scene(&before, |_, c| c < 3);
    write_scene(&after, |_, c| c < 3);

    let params = FloodAnalysisParams {
        extension: "tif".to_string(),
        ..FloodAnalysisParams::default()
    };
    let report = run_flood_analysis(&before, &after, &output, &params).unwrap();

    assert_eq!(report.stats.flooded_cells, 0);
    assert_eq!(report.polygon_count, 0);
    assert!(!output.join("intermediate").exists());

    let flooded = raster_io::read_band(&report.raster_path).unwrap();
    assert_eq!(flooded.dim(), (12, 12));
    assert_eq!(flooded.valid_count(), 0);

    let dataset = Dataset::open(&report.polygon_path).unwrap();
    let layer = dataset.layer(0).unwrap();
    assert_eq!(layer.feature_count(), 0);
    assert!(report.report_path.exists());
}
