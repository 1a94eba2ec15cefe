//! Transform stage: decode a staged file, geolocate its sweeps and write
//! the paired metadata/image artifacts.
//!
//! For a source file with identifier `ID` and product `P`, each sweep at
//! file index `n` produces `ID_P_idxn.json` and `ID_P_idxn.png` in the
//! output directory, and the file gets one `ID_P_colorbar.png`. The staged
//! input is removed whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use radar_common::{RadarError, RadarResult, SweepRecord};

use crate::config::ProductConfig;
use crate::decode::VolumeDecoder;
use crate::fetch::StagedFile;
use crate::geolocate::{geolocate_volume, GeolocatedSweep};
use crate::render::SweepRenderer;
use crate::volume::RadarVolume;

/// Artifacts produced for one source file.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub key: String,
    pub identifier: String,
    pub sweeps: u32,
    /// Records ordered by file index
    pub records: Vec<SweepRecord>,
}

/// Decoder, renderer and output location for one family.
#[derive(Clone)]
pub struct TransformStage {
    decoder: Arc<dyn VolumeDecoder>,
    renderer: Arc<dyn SweepRenderer>,
    output_dir: PathBuf,
    product: ProductConfig,
}

impl TransformStage {
    pub fn new(
        decoder: Arc<dyn VolumeDecoder>,
        renderer: Arc<dyn SweepRenderer>,
        output_dir: impl Into<PathBuf>,
        product: ProductConfig,
    ) -> Self {
        Self {
            decoder,
            renderer,
            output_dir: output_dir.into(),
            product,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Colourbar artifact name for a source file.
    pub fn colorbar_file_name(&self, identifier: &str) -> String {
        format!("{}_{}_colorbar.png", identifier, self.product.name)
    }

    /// Transform `staged`, then delete it.
    #[instrument(skip(self, staged), fields(file = %staged.identifier))]
    pub fn transform_file(&self, staged: &StagedFile) -> RadarResult<TransformResult> {
        let result = self.process(staged);

        match std::fs::remove_file(&staged.path) {
            Ok(()) => debug!(path = %staged.path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %staged.path.display(), error = %e, "Could not remove staged file"),
        }

        result.map_err(|e| match e {
            RadarError::Io(io) => RadarError::Transform {
                file: staged.identifier.clone(),
                message: io.to_string(),
            },
            other => other,
        })
    }

    fn process(&self, staged: &StagedFile) -> RadarResult<TransformResult> {
        let volume = self.decoder.decode(&staged.path)?;
        let mut sweeps = geolocate_volume(&volume, &staged.identifier, &self.product.name)?;
        sweeps.sort_by_key(|s| s.record.file_index);

        // Everything is rendered before the first write so a failed file
        // leaves no partial artifact set behind.
        let mut artifacts = sweeps
            .par_iter()
            .map(|sweep| self.render_sweep(&volume, sweep))
            .collect::<RadarResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        if !sweeps.is_empty() {
            let colorbar = self.renderer.render_colorbar(&self.product)?;
            artifacts.push((self.colorbar_file_name(&staged.identifier), colorbar));
        }

        std::fs::create_dir_all(&self.output_dir)?;
        self.write_artifacts(&artifacts)?;

        info!(sweeps = sweeps.len(), "Transformed file");
        Ok(TransformResult {
            key: staged.key.clone(),
            identifier: staged.identifier.clone(),
            sweeps: sweeps.len() as u32,
            records: sweeps.into_iter().map(|s| s.record).collect(),
        })
    }

    fn render_sweep(
        &self,
        volume: &RadarVolume,
        sweep: &GeolocatedSweep,
    ) -> RadarResult<[(String, Vec<u8>); 2]> {
        let png = self.renderer.render_sweep(volume, sweep, &self.product)?;
        let metadata = serde_json::to_vec_pretty(&sweep.record.metadata())?;
        Ok([
            (sweep.record.image_file_name(), png),
            (sweep.record.metadata_file_name(), metadata),
        ])
    }

    /// Write all artifacts, removing the ones already written if any write fails.
    fn write_artifacts(&self, artifacts: &[(String, Vec<u8>)]) -> RadarResult<()> {
        for (written, (name, data)) in artifacts.iter().enumerate() {
            if let Err(e) = std::fs::write(self.output_dir.join(name), data) {
                for (name, _) in &artifacts[..written] {
                    let path = self.output_dir.join(name);
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!(path = %path.display(), error = %e, "Could not remove partial artifact");
                    }
                }
                return Err(e.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::JsonVolumeDecoder;
    use crate::render::{PpiRenderer, RenderSettings};
    use radar_common::SweepMetadata;
    use std::collections::HashMap;
    use test_utils::{full_rotation_azimuths, gate_ranges, reflectivity_field};

    fn volume_json() -> Vec<u8> {
        let rays = 8;
        let gates = 10;
        // Store order: 1.5 degrees first, then 0.5 degrees
        let mut elevation = vec![1.5; rays];
        elevation.extend(vec![0.5; rays]);
        let mut azimuth = full_rotation_azimuths(rays, 10.0);
        azimuth.extend(full_rotation_azimuths(rays, 5.0));
        let mut field = reflectivity_field(rays, gates, 2);
        field.extend(reflectivity_field(rays, gates, 5));

        let volume = RadarVolume {
            site: "KPDT".to_string(),
            latitude: 45.6906,
            longitude: -118.8529,
            altitude: 462.0,
            azimuth,
            elevation,
            range: gate_ranges(gates, 2125.0, 250.0),
            sweep_start_ray_index: vec![0, rays],
            sweep_end_ray_index: vec![rays - 1, 2 * rays - 1],
            fields: HashMap::from([(
                "reflectivity".to_string(),
                field.into_iter().map(|v| if v.is_nan() { None } else { Some(v) }).collect(),
            )]),
        };
        serde_json::to_vec(&volume).unwrap()
    }

    fn stage(output: &Path) -> TransformStage {
        TransformStage::new(
            Arc::new(JsonVolumeDecoder),
            Arc::new(PpiRenderer::new(RenderSettings {
                width: 32,
                height: 32,
                colorbar_width: 8,
                colorbar_height: 32,
            })),
            output,
            ProductConfig::default(),
        )
    }

    fn staged(dir: &Path, data: &[u8]) -> StagedFile {
        let path = dir.join("KPDT20240501_091522_V06");
        std::fs::write(&path, data).unwrap();
        StagedFile {
            key: "2024/05/01/KPDT/KPDT20240501_091522_V06".to_string(),
            identifier: "KPDT20240501_091522_V06".to_string(),
            path,
            size: data.len() as u64,
        }
    }

    #[test]
    fn test_transform_writes_paired_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plots");
        let staged = staged(dir.path(), &volume_json());

        let result = stage(&output).transform_file(&staged).unwrap();
        assert_eq!(result.sweeps, 2);
        assert!(!staged.path.exists());

        for index in 0..2 {
            let stem = format!("KPDT20240501_091522_V06_reflectivity_idx{}", index);
            assert!(output.join(format!("{}.png", stem)).exists());
            assert!(output.join(format!("{}.json", stem)).exists());
        }
        assert!(output.join("KPDT20240501_091522_V06_reflectivity_colorbar.png").exists());

        // idx0 is the lowest elevation, stored second
        let text = std::fs::read_to_string(output.join("KPDT20240501_091522_V06_reflectivity_idx0.json")).unwrap();
        let meta: SweepMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(meta.original_sweep_number, 2);
        assert_eq!(meta.elevation_index, 1);
        assert_eq!(meta.elevation_angle_degrees, 0.5);
        assert_eq!(meta.azimuth_angle_degrees, 5.0);
        assert!(meta.bounding_box_lon_lat.nw.lat > 45.6906);
    }

    fn sweep_artifacts(output: &Path) -> Vec<String> {
        match std::fs::read_dir(output) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|name| name.contains("_idx"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_failed_colorbar_leaves_no_sweep_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plots");
        let staged = staged(dir.path(), &volume_json());

        let stage = TransformStage::new(
            Arc::new(JsonVolumeDecoder),
            Arc::new(PpiRenderer::new(RenderSettings {
                width: 32,
                height: 32,
                colorbar_width: 0,
                colorbar_height: 32,
            })),
            &output,
            ProductConfig::default(),
        );

        assert!(stage.transform_file(&staged).is_err());
        assert!(!staged.path.exists());
        assert!(sweep_artifacts(&output).is_empty());
    }

    #[test]
    fn test_failed_write_removes_written_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plots");
        let staged = staged(dir.path(), &volume_json());

        // A directory in place of the colourbar makes the last write fail
        std::fs::create_dir_all(output.join("KPDT20240501_091522_V06_reflectivity_colorbar.png")).unwrap();

        let err = stage(&output).transform_file(&staged).unwrap_err();
        assert_eq!(err.stage(), "transform");
        assert!(sweep_artifacts(&output).is_empty());
    }

    #[test]
    fn test_failed_transform_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plots");
        let staged = staged(dir.path(), b"not a volume");

        let err = stage(&output).transform_file(&staged).unwrap_err();
        assert_eq!(err.stage(), "transform");
        assert!(!staged.path.exists());
        assert!(!output.exists());
    }
}
