use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Single-band floating point image (rows x cols). NaN marks NoData.
pub type BandImage = Array2<f32>;

/// Sentinel-2 MSI bands used by the flood analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentinel2Band {
    Blue,
    Green,
    Red,
    RedEdge1,
    Nir,
    Swir2,
}

impl Sentinel2Band {
    /// All bands in band-number order
    pub const ALL: [Sentinel2Band; 6] = [
        Sentinel2Band::Blue,
        Sentinel2Band::Green,
        Sentinel2Band::Red,
        Sentinel2Band::RedEdge1,
        Sentinel2Band::Nir,
        Sentinel2Band::Swir2,
    ];

    /// File name suffix of the band (Sentinel-2 naming convention)
    pub fn suffix(&self) -> &'static str {
        match self {
            Sentinel2Band::Blue => "B02",
            Sentinel2Band::Green => "B03",
            Sentinel2Band::Red => "B04",
            Sentinel2Band::RedEdge1 => "B05",
            Sentinel2Band::Nir => "B08",
            Sentinel2Band::Swir2 => "B12",
        }
    }

    /// Nominal ground sampling distance in meters
    pub fn resolution_m(&self) -> f64 {
        match self {
            Sentinel2Band::RedEdge1 | Sentinel2Band::Swir2 => 20.0,
            _ => 10.0,
        }
    }
}

impl std::fmt::Display for Sentinel2Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Sentinel2Band::Blue => "Blue",
            Sentinel2Band::Green => "Green",
            Sentinel2Band::Red => "Red",
            Sentinel2Band::RedEdge1 => "Red Edge 1",
            Sentinel2Band::Nir => "NIR",
            Sentinel2Band::Swir2 => "SWIR2",
        };
        write!(f, "{} ({})", name, self.suffix())
    }
}

/// Acquisition period of an image set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Acquisition {
    Before,
    After,
}

impl std::fmt::Display for Acquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Acquisition::Before => write!(f, "before"),
            Acquisition::After => write!(f, "after"),
        }
    }
}

/// Affine transform from pixel (col, row) to map coordinates, GDAL ordering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation
    pub fn north_up(top_left_x: f64, top_left_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            top_left_x,
            pixel_width,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height,
        }
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation_x != 0.0 || self.rotation_y != 0.0
    }

    /// Map coordinates of a fractional pixel position (col, row)
    pub fn pixel_to_map(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.top_left_x + col * self.pixel_width + row * self.rotation_x,
            self.top_left_y + col * self.rotation_y + row * self.pixel_height,
        )
    }

    /// Fractional pixel position (col, row) of a map coordinate.
    /// Only valid for unrotated transforms.
    pub fn map_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.top_left_x) / self.pixel_width,
            (y - self.top_left_y) / self.pixel_height,
        )
    }

    /// Ground area of one cell in squared map units
    pub fn cell_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y).abs()
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::north_up(0.0, 0.0, 1.0, -1.0)
    }
}

/// Map extent in map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        let min_x = self.min_x.max(other.min_x);
        let max_x = self.max_x.min(other.max_x);
        let min_y = self.min_y.max(other.min_y);
        let max_y = self.max_y.min(other.max_y);
        if min_x < max_x && min_y < max_y {
            Some(Extent { min_x, max_x, min_y, max_y })
        } else {
            None
        }
    }
}

/// Georeferencing of a raster grid
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoReference {
    pub transform: GeoTransform,
    /// Projection as WKT; empty when unknown
    pub projection: String,
}

/// Georeferenced single-band raster
#[derive(Debug, Clone)]
pub struct Raster {
    pub data: BandImage,
    pub geo: GeoReference,
}

impl Raster {
    pub fn new(data: BandImage, geo: GeoReference) -> Self {
        Self { data, geo }
    }

    /// Raster with the same grid as `self` and new cell values
    pub fn with_data(&self, data: BandImage) -> Self {
        Self {
            data,
            geo: self.geo.clone(),
        }
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn extent(&self) -> Extent {
        let (rows, cols) = self.dim();
        let gt = &self.geo.transform;
        let (x0, y0) = gt.pixel_to_map(0.0, 0.0);
        let (x1, y1) = gt.pixel_to_map(cols as f64, rows as f64);
        Extent {
            min_x: x0.min(x1),
            max_x: x0.max(x1),
            min_y: y0.min(y1),
            max_y: y0.max(y1),
        }
    }

    /// Number of cells holding data (not NaN)
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Number of cells equal to `value`
    pub fn count_value(&self, value: f32) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }
}

/// Band file paths of one acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct Sentinel2BandSet {
    pub folder: PathBuf,
    pub blue: PathBuf,
    pub green: PathBuf,
    pub red: PathBuf,
    pub red_edge1: PathBuf,
    pub nir: PathBuf,
    pub swir2: PathBuf,
}

impl Sentinel2BandSet {
    pub fn path(&self, band: Sentinel2Band) -> &PathBuf {
        match band {
            Sentinel2Band::Blue => &self.blue,
            Sentinel2Band::Green => &self.green,
            Sentinel2Band::Red => &self.red,
            Sentinel2Band::RedEdge1 => &self.red_edge1,
            Sentinel2Band::Nir => &self.nir,
            Sentinel2Band::Swir2 => &self.swir2,
        }
    }
}

/// In-memory band rasters of one acquisition
#[derive(Debug, Clone)]
pub struct PeriodBands {
    pub blue: Raster,
    pub green: Raster,
    pub red: Raster,
    pub red_edge1: Raster,
    pub nir: Raster,
    pub swir2: Raster,
}

/// Error types for flood analysis
#[derive(Debug, thiserror::Error)]
pub enum FloodError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("No {band} file found in {}", folder.display())]
    MissingBand { band: Sentinel2Band, folder: PathBuf },

    #[error("{band} matches {} files in {}: {matches:?}", matches.len(), folder.display())]
    AmbiguousBand {
        band: Sentinel2Band,
        folder: PathBuf,
        matches: Vec<PathBuf>,
    },

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Raster has no valid cells: {0}")]
    EmptyRaster(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for flood analysis operations
pub type FloodResult<T> = Result<T, FloodError>;
