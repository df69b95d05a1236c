//! End-to-end before/after flood analysis

use crate::core::change::{flood_difference, newly_flooded, FloodStats};
use crate::core::composite::{false_color_composite, Composite};
use crate::core::confidence::{high_confidence_water, water_confidence, HIGH_CONFIDENCE};
use crate::core::indices::{ndwi, swi};
use crate::core::polygonize::{polygonize, ValuePolygon};
use crate::core::threshold::{threshold_raster, ThresholdParams};
use crate::types::{Acquisition, FloodResult, PeriodBands, Raster};
use serde::{Deserialize, Serialize};

#[cfg(feature = "gdal")]
use crate::io::{band_discovery::BandLocator, raster_io, vector_io};
#[cfg(feature = "gdal")]
use chrono::{DateTime, Utc};
#[cfg(feature = "gdal")]
use std::io::Write;
#[cfg(feature = "gdal")]
use std::path::{Path, PathBuf};

/// Flood analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodAnalysisParams {
    /// Extension of the band image files
    pub extension: String,
    /// Otsu thresholding parameters
    pub threshold: ThresholdParams,
    /// Also save composites, indices, masks and the raw difference
    pub keep_intermediates: bool,
    /// File name of the final flood raster
    pub raster_name: String,
    /// File name of the final flood polygons
    pub polygon_name: String,
    /// File name of the JSON run report
    pub report_name: String,
}

impl Default for FloodAnalysisParams {
    fn default() -> Self {
        Self {
            extension: "jp2".to_string(),
            threshold: ThresholdParams::default(),
            keep_intermediates: false,
            raster_name: "Flooded_Area_Final_Raster.tif".to_string(),
            polygon_name: "Flooded_Area_Final_Poly.shp".to_string(),
            report_name: "flood_report.json".to_string(),
        }
    }
}

/// Water detection results of one acquisition
#[derive(Debug, Clone)]
pub struct PeriodAnalysis {
    pub acquisition: Acquisition,
    pub composite: Composite,
    pub swi: Raster,
    pub ndwi: Raster,
    pub swi_threshold: f32,
    pub ndwi_threshold: f32,
    pub swi_mask: Raster,
    pub ndwi_mask: Raster,
    /// NDWI mask + SWI mask (0-2)
    pub confidence: Raster,
    /// Confidence with 1 reclassified to 0
    pub water_mask: Raster,
}

/// Detect high-confidence water in one acquisition
pub fn analyze_period(
    acquisition: Acquisition,
    bands: &PeriodBands,
    params: &FloodAnalysisParams,
) -> FloodResult<PeriodAnalysis> {
    log::info!("Processing {} imagery", acquisition);

    let composite = false_color_composite(&bands.nir, &bands.red, &bands.green)?;

    let swi_raster = swi(&bands.red_edge1, &bands.swir2)?;
    let ndwi_raster = ndwi(&bands.green, &bands.nir)?;

    log::info!("Thresholding {} indices", acquisition);
    let (ndwi_mask, ndwi_threshold) = threshold_raster(&ndwi_raster, &params.threshold)?;
    let (swi_mask, swi_threshold) = threshold_raster(&swi_raster, &params.threshold)?;
    log::info!(
        "{} thresholds: NDWI {:.4}, SWI {:.4}",
        acquisition,
        ndwi_threshold,
        swi_threshold
    );

    log::info!("Calculating {} water confidence raster", acquisition);
    let confidence = water_confidence(&ndwi_mask, &swi_mask)?;
    let water_mask = high_confidence_water(&confidence);
    log::info!(
        "{}: {} high-confidence water cells",
        acquisition,
        water_mask.count_value(HIGH_CONFIDENCE)
    );

    Ok(PeriodAnalysis {
        acquisition,
        composite,
        swi: swi_raster,
        ndwi: ndwi_raster,
        swi_threshold,
        ndwi_threshold,
        swi_mask,
        ndwi_mask,
        confidence,
        water_mask,
    })
}

/// Newly flooded area between two acquisitions
#[derive(Debug, Clone)]
pub struct FloodExtent {
    /// after mask - before mask (-2, 0, 2)
    pub difference: Raster,
    /// Newly flooded cells (2), NoData elsewhere
    pub flooded: Raster,
    pub stats: FloodStats,
}

impl FloodExtent {
    /// Polygons of the flooded cells, traced in memory.
    /// The shapefile written by `run_flood_analysis` comes from GDAL's polygonizer.
    pub fn polygons(&self) -> FloodResult<Vec<ValuePolygon>> {
        polygonize(&self.flooded)
    }
}

/// Difference the water masks and extract newly flooded area
pub fn flood_extent(before: &PeriodAnalysis, after: &PeriodAnalysis) -> FloodResult<FloodExtent> {
    log::info!("Subtracting before water mask from after water mask");
    let difference = flood_difference(&after.water_mask, &before.water_mask)?;
    let flooded = newly_flooded(&difference);
    let stats = FloodStats::from_difference(&difference);
    if stats.flooded_cells == 0 {
        log::warn!("No newly flooded cells found");
    }

    log::info!(
        "Flooded area: {} cells, {:.1} map units²",
        stats.flooded_cells,
        stats.flooded_area
    );

    Ok(FloodExtent {
        difference,
        flooded,
        stats,
    })
}

/// Threshold values of one acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub folder: String,
    pub ndwi_threshold: f32,
    pub swi_threshold: f32,
    pub water_cells: usize,
}

/// Outcome of a complete run
#[cfg(feature = "gdal")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodReport {
    pub generated_at: DateTime<Utc>,
    pub params: FloodAnalysisParams,
    pub before: PeriodSummary,
    pub after: PeriodSummary,
    pub stats: FloodStats,
    pub polygon_count: usize,
    /// Area of the shapefile polygons in squared map units
    pub polygon_area: f64,
    pub raster_path: PathBuf,
    pub polygon_path: PathBuf,
    pub report_path: PathBuf,
}

#[cfg(feature = "gdal")]
impl FloodReport {
    /// Write the report as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> FloodResult<()> {
        log::info!("Saving run report: {}", path.as_ref().display());
        let mut writer = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a report written by [`FloodReport::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> FloodResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

#[cfg(feature = "gdal")]
fn save_intermediates(period: &PeriodAnalysis, dir: &Path) -> FloodResult<()> {
    let name = |what: &str| dir.join(format!("{}_{}.tif", period.acquisition, what));
    raster_io::write_composite(&period.composite, name("composite_img"))?;
    raster_io::write_geotiff(&period.swi, name("swi_raster"))?;
    raster_io::write_geotiff(&period.ndwi, name("ndwi_raster"))?;
    raster_io::write_mask_geotiff(&period.swi_mask, name("swi_thresh"))?;
    raster_io::write_mask_geotiff(&period.ndwi_mask, name("ndwi_thresh"))?;
    raster_io::write_mask_geotiff(&period.confidence, name("water_confidence_raster"))?;
    raster_io::write_mask_geotiff(&period.water_mask, name("water_mask_high_confidence"))?;
    Ok(())
}

#[cfg(feature = "gdal")]
fn summarize(period: &PeriodAnalysis, folder: &Path) -> PeriodSummary {
    PeriodSummary {
        folder: folder.display().to_string(),
        ndwi_threshold: period.ndwi_threshold,
        swi_threshold: period.swi_threshold,
        water_cells: period.water_mask.count_value(HIGH_CONFIDENCE),
    }
}

/// Run the whole analysis on two band folders and write the results to `output_dir`
#[cfg(feature = "gdal")]
pub fn run_flood_analysis<P: AsRef<Path>>(
    before_dir: P,
    after_dir: P,
    output_dir: P,
    params: &FloodAnalysisParams,
) -> FloodResult<FloodReport> {
    let (before_dir, after_dir, output_dir) =
        (before_dir.as_ref(), after_dir.as_ref(), output_dir.as_ref());
    log::info!("Starting flood analysis");
    log::debug!("Parameters: {:?}", params);

    let locator = BandLocator::new(&params.extension);
    let before_bands = locator.discover(before_dir)?;
    let after_bands = locator.discover(after_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let after = analyze_period(
        Acquisition::After,
        &raster_io::load_period(&after_bands)?,
        params,
    )?;
    let before = analyze_period(
        Acquisition::Before,
        &raster_io::load_period(&before_bands)?,
        params,
    )?;

    let extent = flood_extent(&before, &after)?;

    if params.keep_intermediates {
        let dir = output_dir.join("intermediate");
        save_intermediates(&before, &dir)?;
        save_intermediates(&after, &dir)?;
        raster_io::write_geotiff(&extent.difference, dir.join("flooded_area_calc.tif"))?;
    }

    let raster_path = output_dir.join(&params.raster_name);
    raster_io::write_mask_geotiff(&extent.flooded, &raster_path)?;
    let polygon_path = output_dir.join(&params.polygon_name);
    let polygons = vector_io::polygonize_to_shapefile(&extent.flooded, &polygon_path)?;

    let report = FloodReport {
        generated_at: Utc::now(),
        params: params.clone(),
        before: summarize(&before, before_dir),
        after: summarize(&after, after_dir),
        stats: extent.stats,
        polygon_count: polygons.polygon_count,
        polygon_area: polygons.total_area,
        raster_path,
        polygon_path,
        report_path: output_dir.join(&params.report_name),
    };
    report.save(&report.report_path)?;

    log::info!("Flood analysis complete");
    Ok(report)
}
