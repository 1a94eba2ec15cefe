//! Configuration loading for the radar ingester.
//!
//! One YAML file holds the shared pipeline settings and the list of
//! product families to poll.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use ingestion::{DecoderConfig, FamilyConfig, PipelineSettings, RenderSettings};

/// Root configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct IngesterConfig {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Files fetched and transformed at once per family
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Seconds between passes of a family in polling mode
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub families: Vec<FamilyConfig>,
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("data/staging")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    300
}

impl IngesterConfig {
    /// Load and validate a configuration file.
    ///
    /// Disabled families are dropped here.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(
            path = %path.display(),
            families = config.families.len(),
            "Loaded ingester configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: IngesterConfig = serde_yaml::from_str(content)?;

        config.families.retain(|family| {
            if !family.enabled {
                debug!(family = %family.id, "Skipping disabled family");
            }
            family.enabled
        });

        if config.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be at least 1");
        }
        config.render.validate()?;
        for family in &config.families {
            family.validate()?;
        }
        let mut ids: Vec<&str> = config.families.iter().map(|f| f.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            anyhow::bail!("duplicate family id '{}'", pair[0]);
        }

        Ok(config)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            staging_dir: self.staging_dir.clone(),
            max_concurrent: self.max_concurrent,
        }
    }
}
