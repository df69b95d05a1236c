use crate::pipeline::{run_flood_analysis, FloodAnalysisParams};
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

/// Python module definition
#[pymodule]
fn _s2flood(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_run_flood_analysis, m)?)?;
    Ok(())
}

/// Run the before/after flood analysis and return a summary dict
#[pyfunction]
#[pyo3(
    name = "run_flood_analysis",
    signature = (before_folder, after_folder, output_folder, keep_intermediates = false, extension = "jp2")
)]
fn py_run_flood_analysis(
    py: Python,
    before_folder: String,
    after_folder: String,
    output_folder: String,
    keep_intermediates: bool,
    extension: &str,
) -> PyResult<PyObject> {
    let params = FloodAnalysisParams {
        extension: extension.to_string(),
        keep_intermediates,
        ..FloodAnalysisParams::default()
    };

    let report = py
        .allow_threads(|| run_flood_analysis(&before_folder, &after_folder, &output_folder, &params))
        .map_err(|e| PyErr::new::<PyRuntimeError, _>(format!("{}", e)))?;

    let result = PyDict::new(py);
    result.set_item("raster_path", report.raster_path.display().to_string())?;
    result.set_item("polygon_path", report.polygon_path.display().to_string())?;
    result.set_item("flooded_cells", report.stats.flooded_cells)?;
    result.set_item("flooded_area", report.stats.flooded_area)?;
    result.set_item("receded_cells", report.stats.receded_cells)?;
    result.set_item("polygon_count", report.polygon_count)?;
    result.set_item("polygon_area", report.polygon_area)?;
    result.set_item("report_path", report.report_path.display().to_string())?;
    result.set_item("before_ndwi_threshold", report.before.ndwi_threshold)?;
    result.set_item("before_swi_threshold", report.before.swi_threshold)?;
    result.set_item("after_ndwi_threshold", report.after.ndwi_threshold)?;
    result.set_item("after_swi_threshold", report.after.swi_threshold)?;
    Ok(result.into())
}
