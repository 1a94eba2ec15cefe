//! Incremental NEXRAD ingestion.
//!
//! Turns new radar files in a public object store into geolocated sweep
//! overlays:
//!
//! - Window listing of Level II volumes and Level III products
//! - Identifier normalization and manifest-based dedup
//! - Fetch into staging, external decode, sweep geolocation
//! - Paired per-sweep PNG and JSON metadata artifacts
//! - Level III code-usage counts rebuilt from artifacts
//!
//! [`FamilyPipeline`] ties the stages together for one product family.

pub mod code_usage;
pub mod config;
pub mod decode;
pub mod fetch;
pub mod filename;
pub mod geolocate;
pub mod listing;
pub mod manifest;
pub mod outcome;
pub mod pipeline;
pub mod render;
pub mod transform;
pub mod volume;

// Re-exports
pub use code_usage::{CodeOption, CodeOptions, CodeUsageTable};
pub use config::{FamilyConfig, ProductConfig};
pub use decode::{CommandDecoder, DecoderConfig, JsonVolumeDecoder, VolumeDecoder};
pub use fetch::{fetch_to_staging, StagedFile};
pub use filename::{normalize, Level3Key};
pub use geolocate::{geolocate_volume, GeolocatedSweep};
pub use listing::{list_level2, list_level3, Candidate, VolumeSuffixes};
pub use manifest::{merge, rebuild_from_artifacts, Manifest, ManifestStore};
pub use outcome::ItemOutcome;
pub use pipeline::{FamilyPipeline, PipelineSettings, RunSummary};
pub use render::{PpiRenderer, RenderSettings, SweepRenderer};
pub use transform::{TransformResult, TransformStage};
pub use volume::RadarVolume;
