//! Input discovery and raster/vector file I/O

pub mod band_discovery;
#[cfg(feature = "gdal")]
pub mod raster_io;
#[cfg(feature = "gdal")]
pub mod vector_io;

pub use band_discovery::{discover_bands, BandLocator};
#[cfg(feature = "gdal")]
pub use raster_io::{load_period, read_band, write_composite, write_geotiff, write_mask_geotiff};
#[cfg(feature = "gdal")]
pub use vector_io::{polygonize_to_shapefile, PolygonSummary};
