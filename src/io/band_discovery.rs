use crate::types::{FloodError, FloodResult, Sentinel2Band, Sentinel2BandSet};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Locates the Sentinel-2 band files of one acquisition folder
pub struct BandLocator {
    extension: String,
}

impl BandLocator {
    /// Locator for files with the given extension (without the dot)
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// List candidate image files in a folder (not recursive), sorted by name
    pub fn list_images<P: AsRef<Path>>(&self, folder: P) -> FloodResult<Vec<PathBuf>> {
        let folder = folder.as_ref();
        let ext_pattern = Regex::new(&format!(r"(?i)\.{}$", regex::escape(&self.extension)))
            .map_err(|e| FloodError::InvalidParameter(format!("Bad extension pattern: {}", e)))?;

        let mut files = Vec::new();
        for entry in std::fs::read_dir(folder)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| ext_pattern.is_match(n))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Pick the single file of `band` from a candidate list
    pub fn select_band(
        &self,
        files: &[PathBuf],
        band: Sentinel2Band,
        folder: &Path,
    ) -> FloodResult<PathBuf> {
        let pattern = Regex::new(&format!(
            r"(?i){}\.{}$",
            band.suffix(),
            regex::escape(&self.extension)
        ))
        .map_err(|e| FloodError::InvalidParameter(format!("Bad band pattern: {}", e)))?;

        let matches: Vec<PathBuf> = files
            .iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| pattern.is_match(n))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        match matches.len() {
            0 => Err(FloodError::MissingBand {
                band,
                folder: folder.to_path_buf(),
            }),
            1 => Ok(matches[0].clone()),
            _ => Err(FloodError::AmbiguousBand {
                band,
                folder: folder.to_path_buf(),
                matches,
            }),
        }
    }

    /// Resolve all six band files of a folder
    pub fn discover<P: AsRef<Path>>(&self, folder: P) -> FloodResult<Sentinel2BandSet> {
        let folder = folder.as_ref();
        log::info!("Creating variables for image bands in {}", folder.display());

        if !folder.is_dir() {
            return Err(FloodError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Image folder not found: {}", folder.display()),
            )));
        }

        let files = self.list_images(folder)?;
        log::debug!("Found {} .{} files", files.len(), self.extension);

        let pick = |band| self.select_band(&files, band, folder);
        let set = Sentinel2BandSet {
            folder: folder.to_path_buf(),
            blue: pick(Sentinel2Band::Blue)?,
            green: pick(Sentinel2Band::Green)?,
            red: pick(Sentinel2Band::Red)?,
            red_edge1: pick(Sentinel2Band::RedEdge1)?,
            nir: pick(Sentinel2Band::Nir)?,
            swir2: pick(Sentinel2Band::Swir2)?,
        };

        for band in Sentinel2Band::ALL {
            log::debug!("{} -> {}", band, set.path(band).display());
        }
        Ok(set)
    }
}

impl Default for BandLocator {
    fn default() -> Self {
        Self::new("jp2")
    }
}

/// Resolve the band files of a folder using `extension`
pub fn discover_bands<P: AsRef<Path>>(folder: P, extension: &str) -> FloodResult<Sentinel2BandSet> {
    BandLocator::new(extension).discover(folder)
}
