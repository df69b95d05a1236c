//! Core flood mapping modules

pub mod band_math;
pub mod change;
pub mod composite;
pub mod confidence;
pub mod grid;
pub mod indices;
pub mod polygonize;
pub mod reclassify;
pub mod threshold;

// Re-export main types
pub use change::{flood_difference, newly_flooded, FloodStats};
pub use composite::{false_color_composite, Composite};
pub use confidence::{high_confidence_water, water_confidence};
pub use indices::{ndwi, normalized_difference, swi};
pub use polygonize::{polygonize, ValuePolygon};
pub use reclassify::{reclassify, RemapTarget, RemapValue};
pub use threshold::{binarize, otsu_threshold, threshold_raster, ThresholdParams};
