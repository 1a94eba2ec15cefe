//! Family pass scheduling: one pass over every family, or polling until
//! shutdown.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, instrument};

use ingestion::{FamilyPipeline, PpiRenderer, RunSummary};
use radar_common::RadarResult;
use storage::S3RemoteStore;

use crate::config::IngesterConfig;

/// Latest pass result of one family, served by `/status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FamilyStatus {
    pub family: String,
    pub kind: String,
    pub site: String,
    pub passes: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_summary: Option<RunSummary>,
    pub last_error: Option<String>,
}

/// Shared, per-family pass status.
#[derive(Debug, Default)]
pub struct StatusBoard {
    families: RwLock<BTreeMap<String, FamilyStatus>>,
}

impl StatusBoard {
    pub async fn register(&self, pipeline: &FamilyPipeline) {
        let config = pipeline.config();
        self.families.write().await.insert(
            config.id.clone(),
            FamilyStatus {
                family: config.id.clone(),
                kind: config.kind.to_string(),
                site: config.site.clone(),
                ..FamilyStatus::default()
            },
        );
    }

    pub async fn record(&self, family: &str, result: &RadarResult<RunSummary>) {
        let mut families = self.families.write().await;
        let status = families
            .entry(family.to_string())
            .or_insert_with(|| FamilyStatus {
                family: family.to_string(),
                ..FamilyStatus::default()
            });
        status.passes += 1;
        status.last_run = Some(Utc::now());
        match result {
            Ok(summary) => {
                status.last_summary = Some(summary.clone());
                status.last_error = None;
            }
            Err(e) => status.last_error = Some(e.to_string()),
        }
    }

    pub async fn snapshot(&self) -> Vec<FamilyStatus> {
        self.families.read().await.values().cloned().collect()
    }
}

/// Runs family pipelines once or on an interval.
pub struct Scheduler {
    pipelines: Vec<FamilyPipeline>,
    poll_interval: Duration,
    status: Arc<StatusBoard>,
}

impl Scheduler {
    /// Build a pipeline per configured family, optionally only `only`.
    ///
    /// Each family gets its own store client bound to its bucket; the
    /// decoder and renderer are shared.
    pub async fn from_config(
        config: &IngesterConfig,
        only: Option<&str>,
        status: Arc<StatusBoard>,
    ) -> Result<Self> {
        let decoder = config.decoder.build();
        let renderer = Arc::new(PpiRenderer::new(config.render.clone()));
        let settings = config.pipeline_settings();

        let mut pipelines = Vec::new();
        for family in &config.families {
            if only.map_or(false, |id| id != family.id) {
                continue;
            }
            let store = S3RemoteStore::connect(&family.store_config()).await;
            info!(
                family = %family.id,
                kind = %family.kind,
                bucket = %family.bucket_name(),
                site = %family.site,
                "Configured family"
            );
            pipelines.push(FamilyPipeline::new(
                family.clone(),
                Arc::new(store),
                decoder.clone(),
                renderer.clone(),
                settings.clone(),
            ));
        }

        if let Some(id) = only {
            if pipelines.is_empty() {
                anyhow::bail!("family '{}' is not configured or is disabled", id);
            }
        }

        Self::new(
            pipelines,
            Duration::from_secs(config.poll_interval_secs),
            status,
        )
        .await
    }

    pub async fn new(
        pipelines: Vec<FamilyPipeline>,
        poll_interval: Duration,
        status: Arc<StatusBoard>,
    ) -> Result<Self> {
        for pipeline in &pipelines {
            status.register(pipeline).await;
        }
        Ok(Self {
            pipelines,
            poll_interval,
            status,
        })
    }

    pub fn family_count(&self) -> usize {
        self.pipelines.len()
    }

    /// One pass over every family, concurrently.
    ///
    /// A family whose pass fails is logged and recorded; the others are
    /// unaffected.
    #[instrument(skip(self), fields(families = self.pipelines.len()))]
    pub async fn run_once(&self) -> Vec<(String, RadarResult<RunSummary>)> {
        let now = Utc::now();
        let passes = self.pipelines.iter().map(|pipeline| async move {
            let id = pipeline.config().id.clone();
            let result = pipeline.run(now).await;
            if let Err(e) = &result {
                error!(family = %id, stage = e.stage(), error = %e, "Family pass failed");
            }
            self.status.record(&id, &result).await;
            (id, result)
        });
        join_all(passes).await
    }

    /// Run passes every `poll_interval` until `shutdown` fires.
    pub async fn run_forever(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        loop {
            self.run_once().await;

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutting down scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        Ok(())
    }

    /// Rewrite every family's manifest from its rendered artifacts.
    pub fn rebuild_manifests(&self) -> Result<()> {
        for pipeline in &self.pipelines {
            let id = &pipeline.config().id;
            pipeline
                .rebuild_manifest()
                .with_context(|| format!("Failed to rebuild manifest for family '{}'", id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::{FamilyConfig, JsonVolumeDecoder, PipelineSettings};
    use radar_common::ProductFamily;
    use storage::InMemoryStore;

    fn pipeline(root: &std::path::Path, id: &str, store: InMemoryStore) -> FamilyPipeline {
        let config = FamilyConfig::new(
            id,
            ProductFamily::Level2,
            "KPDT",
            root.join(format!("{}.json", id)),
            root.join(id),
        );
        FamilyPipeline::new(
            config,
            Arc::new(store),
            Arc::new(JsonVolumeDecoder),
            Arc::new(PpiRenderer::default()),
            PipelineSettings {
                staging_dir: root.join("staging"),
                max_concurrent: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_failed_family_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let today = Utc::now().format("%Y/%m/%d/KPDT/").to_string();

        let failing = InMemoryStore::new("noaa-nexrad-level2");
        failing.fail_list(today);
        let status = Arc::new(StatusBoard::default());
        let scheduler = Scheduler::new(
            vec![
                pipeline(dir.path(), "broken", failing),
                pipeline(dir.path(), "empty", InMemoryStore::new("noaa-nexrad-level2")),
            ],
            Duration::from_secs(60),
            status.clone(),
        )
        .await
        .unwrap();

        let results = scheduler.run_once().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());

        let snapshot = status.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        let broken = snapshot.iter().find(|s| s.family == "broken").unwrap();
        assert_eq!(broken.passes, 1);
        assert!(broken.last_error.is_some());
        let empty = snapshot.iter().find(|s| s.family == "empty").unwrap();
        assert_eq!(empty.last_summary.as_ref().unwrap().discovered, 0);
        assert_eq!(empty.kind, "level2");
    }

    #[tokio::test]
    async fn test_run_forever_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(StatusBoard::default());
        let scheduler = Scheduler::new(
            vec![pipeline(dir.path(), "empty", InMemoryStore::new("noaa-nexrad-level2"))],
            Duration::from_secs(3600),
            status.clone(),
        )
        .await
        .unwrap();

        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();
        scheduler.run_forever(rx).await.unwrap();
        assert_eq!(status.snapshot().await[0].passes, 1);
    }
}
