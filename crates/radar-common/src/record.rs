//! Per-sweep records and manifest entries.

use serde::{Deserialize, Serialize};

use crate::bbox::CornerBox;

/// Value stored in the manifest for one ingested source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub sweeps: u32,
}

impl ManifestEntry {
    pub fn new(sweeps: u32) -> Self {
        Self { sweeps }
    }
}

/// Geolocated description of one sweep of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    /// Artifact base name of the source file
    pub source_file: String,
    /// Product label used in artifact names (e.g. "reflectivity")
    pub product: String,
    /// 1-based position of the sweep in store order
    pub original_sweep_number: u32,
    /// 0-based position among the file's sweeps sorted by (elevation, azimuth)
    pub file_index: usize,
    /// 1-based rank of this sweep's elevation among the file's distinct elevations
    pub elevation_index: u32,
    pub elevation_degrees: f64,
    /// Azimuth of the first ray in the sweep
    pub azimuth_degrees: f64,
    pub bounding_box: CornerBox,
}

impl SweepRecord {
    /// Shared stem of the metadata and image artifacts: `<source>_<product>_idx<n>`.
    pub fn artifact_stem(&self) -> String {
        artifact_stem(&self.source_file, &self.product, self.file_index)
    }

    pub fn metadata_file_name(&self) -> String {
        format!("{}.json", self.artifact_stem())
    }

    pub fn image_file_name(&self) -> String {
        format!("{}.png", self.artifact_stem())
    }

    pub fn metadata(&self) -> SweepMetadata {
        SweepMetadata {
            original_sweep_number: self.original_sweep_number,
            elevation_index: self.elevation_index,
            elevation_angle_degrees: self.elevation_degrees,
            azimuth_angle_degrees: self.azimuth_degrees,
            bounding_box_lon_lat: self.bounding_box,
        }
    }
}

/// Build the artifact stem for a source file, product and sweep index.
pub fn artifact_stem(source_file: &str, product: &str, file_index: usize) -> String {
    format!("{}_{}_idx{}", source_file, product, file_index)
}

/// On-disk JSON shape of a per-sweep metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepMetadata {
    pub original_sweep_number: u32,
    pub elevation_index: u32,
    pub elevation_angle_degrees: f64,
    pub azimuth_angle_degrees: f64,
    pub bounding_box_lon_lat: CornerBox,
}
