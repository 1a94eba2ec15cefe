//! Per-family pipeline orchestration.
//!
//! One pass moves through `DISCOVER -> DEDUP -> FANOUT -> RECONCILE ->
//! CLEANUP`. Listing or manifest failures abort the pass for this family
//! only; per-file failures become [`ItemOutcome`]s and never unwind the
//! batch. The manifest is read once before fan-out and written once after
//! every fan-out unit has finished. Cleanup runs whatever happened before
//! it.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use radar_common::{ManifestEntry, ProductFamily, RadarError, RadarResult};
use storage::RemoteStore;

use crate::config::FamilyConfig;
use crate::decode::VolumeDecoder;
use crate::fetch::fetch_to_staging;
use crate::filename::normalize;
use crate::listing::{list_level2, list_level3, Candidate};
use crate::manifest::{rebuild_from_artifacts, Manifest, ManifestStore};
use crate::outcome::ItemOutcome;
use crate::render::SweepRenderer;
use crate::transform::{TransformResult, TransformStage};

/// Settings shared by every family pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Root of per-family staging directories
    pub staging_dir: PathBuf,
    /// Files fetched and transformed at once
    pub max_concurrent: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("data/staging"),
            max_concurrent: 4,
        }
    }
}

/// Counters for one family pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub family: String,
    /// Candidates inside the window
    pub discovered: usize,
    /// Candidates skipped by the parser
    pub skipped: usize,
    /// Candidates already in the manifest
    pub already_ingested: usize,
    pub fetched: usize,
    pub fetch_failed: usize,
    pub transformed: usize,
    pub transform_failed: usize,
    /// Sweeps written across all transformed files
    pub sweeps: u64,
    /// Manifest size after reconciliation
    pub manifest_entries: usize,
    pub duration_secs: f64,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Discover, fetch and transform new files of one product family.
pub struct FamilyPipeline {
    config: FamilyConfig,
    store: Arc<dyn RemoteStore>,
    stage: TransformStage,
    settings: PipelineSettings,
}

impl FamilyPipeline {
    pub fn new(
        config: FamilyConfig,
        store: Arc<dyn RemoteStore>,
        decoder: Arc<dyn VolumeDecoder>,
        renderer: Arc<dyn SweepRenderer>,
        settings: PipelineSettings,
    ) -> Self {
        let stage = TransformStage::new(
            decoder,
            renderer,
            config.output_dir.clone(),
            config.product.clone(),
        );
        Self {
            config,
            store,
            stage,
            settings,
        }
    }

    pub fn config(&self) -> &FamilyConfig {
        &self.config
    }

    /// Staging directory owned by this family.
    pub fn staging_dir(&self) -> PathBuf {
        self.settings.staging_dir.join(&self.config.id)
    }

    fn manifest(&self) -> ManifestStore {
        ManifestStore::new(&self.config.manifest_path)
    }

    /// Run one pass for the window ending at `now`.
    #[instrument(skip(self), fields(family = %self.config.id, kind = %self.config.kind))]
    pub async fn run(&self, now: DateTime<Utc>) -> RadarResult<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary {
            family: self.config.id.clone(),
            ..RunSummary::default()
        };

        let result = self.run_stages(now, &mut summary).await;
        self.cleanup().await;

        summary.duration_secs = started.elapsed().as_secs_f64();
        summary.finished_at = Some(Utc::now());

        match result {
            Ok(()) => {
                info!(
                    discovered = summary.discovered,
                    already_ingested = summary.already_ingested,
                    fetched = summary.fetched,
                    fetch_failed = summary.fetch_failed,
                    transformed = summary.transformed,
                    transform_failed = summary.transform_failed,
                    sweeps = summary.sweeps,
                    duration_secs = summary.duration_secs,
                    "Family pass complete"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(stage = e.stage(), error = %e, "Family pass aborted");
                Err(e)
            }
        }
    }

    async fn run_stages(&self, now: DateTime<Utc>, summary: &mut RunSummary) -> RadarResult<()> {
        // DISCOVER
        let candidates = self.discover(now, summary).await?;

        // DEDUP
        let manifest = self.manifest().load()?;
        let selected = self.select_new(candidates, &manifest, summary);
        if selected.is_empty() {
            info!(already_ingested = summary.already_ingested, "No new files");
        }

        // FANOUT
        let outcomes = self.fan_out(selected).await;
        let mut updates = Manifest::new();
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Done(result) => {
                    summary.fetched += 1;
                    summary.transformed += 1;
                    summary.sweeps += result.sweeps as u64;
                    if result.sweeps > 0 {
                        updates.insert(result.identifier, ManifestEntry::new(result.sweeps));
                    } else {
                        warn!(key = %result.key, "File produced no sweeps, leaving it out of the manifest");
                    }
                }
                ItemOutcome::Failed { stage: "fetch", .. } => summary.fetch_failed += 1,
                ItemOutcome::Failed { .. } => {
                    summary.fetched += 1;
                    summary.transform_failed += 1;
                }
                ItemOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }

        // RECONCILE
        summary.manifest_entries = if updates.is_empty() {
            manifest.len()
        } else {
            self.manifest().merge_and_save(updates)?.len()
        };

        if self.config.kind == ProductFamily::Level3 {
            if let Some(table) = self.config.code_table() {
                table.recount(&self.config.output_dir, &self.config.product.name)?;
            }
        }

        Ok(())
    }

    async fn discover(&self, now: DateTime<Utc>, summary: &mut RunSummary) -> RadarResult<Vec<Candidate>> {
        let window = self.config.window(now);
        let outcomes = match self.config.kind {
            ProductFamily::Level2 => {
                list_level2(self.store.as_ref(), &window, &self.config.suffixes()).await?
            }
            ProductFamily::Level3 => {
                let codes = self.config.resolve_codes()?;
                list_level3(self.store.as_ref(), &window, &codes).await?
            }
        };

        let mut candidates = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Done(candidate) => candidates.push(candidate),
                _ => summary.skipped += 1,
            }
        }
        summary.discovered = candidates.len();
        Ok(candidates)
    }

    /// Drop candidates whose identifier is already ingested or repeated.
    fn select_new(
        &self,
        candidates: Vec<Candidate>,
        manifest: &Manifest,
        summary: &mut RunSummary,
    ) -> Vec<(Candidate, String)> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for candidate in candidates {
            let identifier = match normalize(self.config.kind, &candidate.key) {
                Ok(identifier) => identifier,
                Err(e) => {
                    warn!(key = %candidate.key, stage = "parse", error = %e, "Cannot normalize key");
                    summary.skipped += 1;
                    continue;
                }
            };

            if manifest.contains_key(&identifier) {
                summary.already_ingested += 1;
                debug!(identifier = %identifier, "Already ingested");
            } else if seen.insert(identifier.clone()) {
                selected.push((candidate, identifier));
            }
        }

        info!(selected = selected.len(), "Selected new files");
        selected
    }

    /// Fetch and transform every selected file, `max_concurrent` at a time.
    async fn fan_out(&self, selected: Vec<(Candidate, String)>) -> Vec<ItemOutcome<TransformResult>> {
        let staging = self.staging_dir();
        let width = self.settings.max_concurrent.max(1);

        stream::iter(selected)
            .map(|(candidate, identifier)| {
                let store = Arc::clone(&self.store);
                let stage = self.stage.clone();
                let staging = staging.clone();
                async move { process_file(store, stage, candidate.key, identifier, staging).await }
            })
            .buffer_unordered(width)
            .collect()
            .await
    }

    /// Remove this family's staging directory.
    async fn cleanup(&self) {
        let staging = self.staging_dir();
        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => debug!(path = %staging.display(), "Cleaned staging directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %staging.display(), stage = "cleanup", error = %e, "Cleanup failed"),
        }
    }

    /// Replace the manifest with one derived from rendered artifacts.
    #[instrument(skip(self), fields(family = %self.config.id))]
    pub fn rebuild_manifest(&self) -> RadarResult<usize> {
        let manifest = rebuild_from_artifacts(&self.config.output_dir, &self.config.product.name)?;
        self.manifest().save(&manifest)?;
        info!(entries = manifest.len(), "Manifest rebuilt from artifacts");
        Ok(manifest.len())
    }
}

/// Fetch one file, then transform it on a blocking thread.
async fn process_file(
    store: Arc<dyn RemoteStore>,
    stage: TransformStage,
    key: String,
    identifier: String,
    staging: PathBuf,
) -> ItemOutcome<TransformResult> {
    let staged = match fetch_to_staging(store.as_ref(), &key, &identifier, &staging).await {
        Ok(staged) => staged,
        Err(e) => {
            warn!(key = %key, stage = "fetch", error = %e, "Fetch failed");
            return ItemOutcome::failed(key, e);
        }
    };

    debug!(key = %key, path = %staged.path.display(), "Fetched");

    let transformed = tokio::task::spawn_blocking(move || stage.transform_file(&staged))
        .await
        .unwrap_or_else(|e| {
            Err(RadarError::Transform {
                file: identifier.clone(),
                message: format!("transform task failed: {}", e),
            })
        });

    match transformed {
        Ok(result) => ItemOutcome::Done(result),
        Err(e) => {
            error!(key = %key, stage = "transform", error = %e, "Transform failed");
            ItemOutcome::failed(key, e)
        }
    }
}
