//! Per-family ingestion configuration.
//!
//! One [`FamilyConfig`] describes a product family pipeline: where to list,
//! which site and look-back window, which field to render, and where the
//! manifest and artifacts live.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use radar_common::{IngestWindow, ProductFamily, RadarError, RadarResult};
use storage::RemoteStoreConfig;

use crate::code_usage::CodeUsageTable;
use crate::listing::VolumeSuffixes;

/// Public bucket of Level II volumes.
pub const LEVEL2_BUCKET: &str = "noaa-nexrad-level2";

/// Public bucket of Level III products.
pub const LEVEL3_BUCKET: &str = "unidata-nexrad-level3";

/// Field to render and its colour range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Label used in artifact names and the code options file
    #[serde(default = "default_product_name")]
    pub name: String,
    /// Moment in the decoded volume
    #[serde(default = "default_product_name")]
    pub field: String,
    #[serde(default = "default_vmin")]
    pub vmin: f32,
    #[serde(default = "default_vmax")]
    pub vmax: f32,
}

fn default_product_name() -> String {
    "reflectivity".to_string()
}

fn default_vmin() -> f32 {
    -20.0
}

fn default_vmax() -> f32 {
    60.0
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            name: default_product_name(),
            field: default_product_name(),
            vmin: default_vmin(),
            vmax: default_vmax(),
        }
    }
}

/// Configuration of one family pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub id: String,
    pub kind: ProductFamily,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Defaults to the public archive bucket of `kind`
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override, e.g. a local mirror
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Four-letter site identifier, e.g. "KPDT"
    pub site: String,
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u32,
    #[serde(default)]
    pub product: ProductConfig,
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,

    // Level II
    #[serde(default = "default_volume_suffix")]
    pub volume_suffix: String,
    #[serde(default = "default_exclude_suffix")]
    pub exclude_suffix: String,

    // Level III
    #[serde(default)]
    pub codes: Vec<String>,
    /// Code options file supplying codes for `product.name` and receiving
    /// usage counts
    #[serde(default)]
    pub codes_path: Option<PathBuf>,

    #[serde(default = "default_max_keys")]
    pub max_keys: i32,
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_lookback_minutes() -> u32 {
    180
}

fn default_volume_suffix() -> String {
    "V06".to_string()
}

fn default_exclude_suffix() -> String {
    "_MDM".to_string()
}

fn default_max_keys() -> i32 {
    1000
}

impl FamilyConfig {
    /// Minimal configuration with defaults for everything optional.
    pub fn new(
        id: impl Into<String>,
        kind: ProductFamily,
        site: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: true,
            bucket: None,
            region: default_region(),
            endpoint: None,
            site: site.into(),
            lookback_minutes: default_lookback_minutes(),
            product: ProductConfig::default(),
            manifest_path: manifest_path.into(),
            output_dir: output_dir.into(),
            volume_suffix: default_volume_suffix(),
            exclude_suffix: default_exclude_suffix(),
            codes: Vec::new(),
            codes_path: None,
            max_keys: default_max_keys(),
        }
    }

    pub fn bucket_name(&self) -> &str {
        match (&self.bucket, self.kind) {
            (Some(bucket), _) => bucket,
            (None, ProductFamily::Level2) => LEVEL2_BUCKET,
            (None, ProductFamily::Level3) => LEVEL3_BUCKET,
        }
    }

    pub fn store_config(&self) -> RemoteStoreConfig {
        RemoteStoreConfig {
            bucket: self.bucket_name().to_string(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            max_keys: self.max_keys,
        }
    }

    pub fn suffixes(&self) -> VolumeSuffixes {
        VolumeSuffixes {
            volume: self.volume_suffix.clone(),
            exclude: self.exclude_suffix.clone(),
        }
    }

    /// Ingest window of `lookback_minutes` ending at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> IngestWindow {
        IngestWindow::ending_at(self.site.clone(), now, self.lookback_minutes)
    }

    pub fn code_table(&self) -> Option<CodeUsageTable> {
        self.codes_path.as_ref().map(CodeUsageTable::new)
    }

    /// Level III product codes: the explicit list, else the options file.
    pub fn resolve_codes(&self) -> RadarResult<Vec<String>> {
        if !self.codes.is_empty() {
            return Ok(self.codes.clone());
        }
        match self.code_table() {
            Some(table) => table.codes_for(&self.product.name),
            None => Err(RadarError::Config(format!(
                "family '{}' lists no product codes and has no codes_path",
                self.id
            ))),
        }
    }

    pub fn validate(&self) -> RadarResult<()> {
        if self.id.trim().is_empty() {
            return Err(RadarError::Config("family id is empty".to_string()));
        }
        if self.site.len() != 4 || !self.site.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RadarError::Config(format!(
                "family '{}': site '{}' is not a four-letter identifier",
                self.id, self.site
            )));
        }
        if self.product.vmin >= self.product.vmax {
            return Err(RadarError::Config(format!(
                "family '{}': vmin {} is not below vmax {}",
                self.id, self.product.vmin, self.product.vmax
            )));
        }
        if self.max_keys <= 0 {
            return Err(RadarError::Config(format!(
                "family '{}': max_keys must be positive",
                self.id
            )));
        }
        if self.kind == ProductFamily::Level3 && self.codes.is_empty() && self.codes_path.is_none() {
            return Err(RadarError::Config(format!(
                "family '{}': level3 needs codes or codes_path",
                self.id
            )));
        }
        Ok(())
    }
}
