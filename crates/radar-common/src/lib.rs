//! Common types and utilities shared across the radar ingestion crates.

pub mod bbox;
pub mod error;
pub mod family;
pub mod record;
pub mod time;

pub use bbox::{CartesianExtent, CornerBox, LonLat};
pub use error::{RadarError, RadarResult};
pub use family::ProductFamily;
pub use record::{ManifestEntry, SweepMetadata, SweepRecord};
pub use time::IngestWindow;
