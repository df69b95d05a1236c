use crate::core::composite::Composite;
use crate::types::{
    FloodError, FloodResult, GeoReference, GeoTransform, PeriodBands, Raster, Sentinel2Band,
    Sentinel2BandSet,
};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

/// NoData marker of byte mask GeoTIFFs
pub const MASK_NODATA: u8 = 255;

/// Read band 1 of a raster file as f32; the file's NoData value becomes NaN
pub fn read_band<P: AsRef<Path>>(path: P) -> FloodResult<Raster> {
    log::debug!("Reading raster: {}", path.as_ref().display());

    let dataset = Dataset::open(path.as_ref())?;
    let geo_transform = dataset.geo_transform()?;
    let (width, height) = dataset.raster_size();

    let rasterband = dataset.rasterband(1)?;
    let no_data = rasterband.no_data_value();
    let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    let mut data = Array2::from_shape_vec((height, width), band_data.data)
        .map_err(|e| FloodError::Processing(format!("Failed to reshape band data: {}", e)))?;
    if let Some(nd) = no_data {
        let nd = nd as f32;
        data.mapv_inplace(|v| if v == nd { f32::NAN } else { v });
    }

    log::debug!("Raster size: {}x{}, geotransform: {:?}", width, height, geo_transform);
    Ok(Raster::new(
        data,
        GeoReference {
            transform: GeoTransform::from_gdal(geo_transform),
            projection: dataset.projection(),
        },
    ))
}

/// Read all six bands of an acquisition
pub fn load_period(bands: &Sentinel2BandSet) -> FloodResult<PeriodBands> {
    log::info!("Loading bands from {}", bands.folder.display());
    let read = |band: Sentinel2Band| read_band(bands.path(band));
    Ok(PeriodBands {
        blue: read(Sentinel2Band::Blue)?,
        green: read(Sentinel2Band::Green)?,
        red: read(Sentinel2Band::Red)?,
        red_edge1: read(Sentinel2Band::RedEdge1)?,
        nir: read(Sentinel2Band::Nir)?,
        swir2: read(Sentinel2Band::Swir2)?,
    })
}

fn set_georeference(dataset: &mut Dataset, geo: &GeoReference) -> FloodResult<()> {
    dataset.set_geo_transform(&geo.transform.to_gdal())?;
    if !geo.projection.is_empty() {
        dataset.set_projection(&geo.projection)?;
    }
    Ok(())
}

fn create_parent<P: AsRef<Path>>(path: P) -> FloodResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Save a raster as a Float32 GeoTIFF with NaN NoData
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster, output_path: P) -> FloodResult<()> {
    log::info!("Saving raster: {}", output_path.as_ref().display());
    create_parent(&output_path)?;

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (height, width) = raster.dim();
    let mut dataset = driver.create_with_band_type::<f32, _>(
        output_path.as_ref(),
        width as isize,
        height as isize,
        1,
    )?;
    set_georeference(&mut dataset, &raster.geo)?;

    let mut rasterband = dataset.rasterband(1)?;
    let flat_data: Vec<f32> = raster.data.iter().cloned().collect();
    let buffer = Buffer::new((width, height), flat_data);
    rasterband.write((0, 0), (width, height), &buffer)?;
    rasterband.set_no_data_value(Some(f32::NAN as f64))?;
    Ok(())
}

fn mask_bytes(raster: &Raster) -> FloodResult<Vec<u8>> {
    let mut flat_data = Vec::with_capacity(raster.data.len());
    for &v in raster.data.iter() {
        if v.is_nan() {
            flat_data.push(MASK_NODATA);
        } else if v >= 0.0 && v < MASK_NODATA as f32 && v.fract() == 0.0 {
            flat_data.push(v as u8);
        } else {
            return Err(FloodError::Processing(format!(
                "Value {} cannot be stored in a byte mask",
                v
            )));
        }
    }
    Ok(flat_data)
}

/// Create a single-band Byte dataset holding `raster` with [`MASK_NODATA`] set.
/// `driver_name` is "GTiff" for files or "MEM" for in-memory work.
pub(crate) fn mask_dataset<P: AsRef<Path>>(
    driver_name: &str,
    path: P,
    raster: &Raster,
) -> FloodResult<Dataset> {
    let flat_data = mask_bytes(raster)?;

    let driver = DriverManager::get_driver_by_name(driver_name)?;
    let (height, width) = raster.dim();
    let mut dataset = driver.create_with_band_type::<u8, _>(
        path.as_ref(),
        width as isize,
        height as isize,
        1,
    )?;
    set_georeference(&mut dataset, &raster.geo)?;

    let mut rasterband = dataset.rasterband(1)?;
    let buffer = Buffer::new((width, height), flat_data);
    rasterband.write((0, 0), (width, height), &buffer)?;
    rasterband.set_no_data_value(Some(MASK_NODATA as f64))?;
    Ok(dataset)
}

/// Save an integer-valued raster (masks, confidence) as a Byte GeoTIFF.
/// NaN cells are written as [`MASK_NODATA`].
pub fn write_mask_geotiff<P: AsRef<Path>>(raster: &Raster, output_path: P) -> FloodResult<()> {
    log::info!("Saving mask raster: {}", output_path.as_ref().display());
    create_parent(&output_path)?;
    mask_dataset("GTiff", output_path, raster)?;
    Ok(())
}

/// Save a composite as a multi-band Float32 GeoTIFF
pub fn write_composite<P: AsRef<Path>>(composite: &Composite, output_path: P) -> FloodResult<()> {
    log::info!("Saving composite: {}", output_path.as_ref().display());
    create_parent(&output_path)?;

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (height, width) = composite.dim();
    let mut dataset = driver.create_with_band_type::<f32, _>(
        output_path.as_ref(),
        width as isize,
        height as isize,
        composite.bands.len() as isize,
    )?;
    set_georeference(&mut dataset, &composite.geo)?;

    for (i, band) in composite.bands.iter().enumerate() {
        let mut rasterband = dataset.rasterband(i as isize + 1)?;
        let flat_data: Vec<f32> = band.data.iter().cloned().collect();
        let buffer = Buffer::new((width, height), flat_data);
        rasterband.write((0, 0), (width, height), &buffer)?;
        rasterband.set_no_data_value(Some(f32::NAN as f64))?;
    }
    Ok(())
}
