use crate::core::grid::align_all;
use crate::types::{FloodResult, GeoReference, Raster};

/// Multi-band composite on a single grid
#[derive(Debug, Clone)]
pub struct Composite {
    pub bands: Vec<Raster>,
    pub geo: GeoReference,
}

impl Composite {
    /// (rows, cols) of every band
    pub fn dim(&self) -> (usize, usize) {
        self.bands.first().map(|b| b.dim()).unwrap_or((0, 0))
    }
}

/// False-color infrared composite (NIR, Red, Green as R, G, B).
/// Vegetation shows red, open water dark.
pub fn false_color_composite(nir: &Raster, red: &Raster, green: &Raster) -> FloodResult<Composite> {
    log::info!("Creating false-color composite (NIR, Red, Green)");
    let bands = align_all(&[nir, red, green])?;
    let geo = bands[0].geo.clone();
    Ok(Composite { bands, geo })
}
