//! s2flood: before/after flood extent mapping from Sentinel-2 imagery
//!
//! Water is detected per acquisition with two spectral indices (SWI and NDWI),
//! each split into water/non-water with Otsu's method. Cells flagged by both
//! indices count as water; cells that are water after but not before are the
//! newly flooded area, written as a GeoTIFF and a polygon shapefile.

pub mod core;
pub mod io;
pub mod pipeline;
pub mod types;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    Acquisition, FloodError, FloodResult, GeoReference, GeoTransform, PeriodBands, Raster,
    Sentinel2Band, Sentinel2BandSet,
};

pub use io::{discover_bands, BandLocator};
pub use pipeline::{analyze_period, flood_extent, FloodAnalysisParams, FloodExtent, PeriodAnalysis};

#[cfg(feature = "gdal")]
pub use pipeline::{run_flood_analysis, FloodReport};
