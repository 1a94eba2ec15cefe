//! NEXRAD radar ingester service.
//!
//! Polls public NEXRAD buckets and turns new files into geolocated sweep
//! overlays:
//! - Level II volumes and Level III products per configured family
//! - Manifest-based dedup so each file is processed once
//! - Paired per-sweep PNG and JSON metadata artifacts
//! - HTTP status API for monitoring

mod config;
mod scheduler;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::IngesterConfig;
use scheduler::{Scheduler, StatusBoard};
use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "radar-ingester")]
#[command(about = "Incremental NEXRAD sweep overlay ingester")]
struct Args {
    /// Configuration file
    #[arg(long, env = "CONFIG_PATH", default_value = "config/radar-ingester.yaml")]
    config: PathBuf,

    /// Run one pass and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Specific family to run (default: all enabled)
    #[arg(short, long)]
    family: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Port for status HTTP server
    #[arg(long, env = "STATUS_PORT", default_value = "8082")]
    status_port: u16,

    /// Disable status HTTP server
    #[arg(long)]
    no_status_server: bool,

    /// Override the staging directory from the configuration file
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Rebuild manifests from rendered artifacts and exit
    #[arg(long)]
    rebuild_manifest: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let started = Instant::now();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting radar ingester");

    let mut config = IngesterConfig::load(&args.config)?;
    if let Some(staging_dir) = &args.staging_dir {
        config.staging_dir = staging_dir.clone();
    }
    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| format!("Failed to create staging dir {}", config.staging_dir.display()))?;

    let status = Arc::new(StatusBoard::default());
    let scheduler = Scheduler::from_config(&config, args.family.as_deref(), status.clone()).await?;

    if args.rebuild_manifest {
        scheduler.rebuild_manifests()?;
        info!(families = scheduler.family_count(), "Manifests rebuilt");
        return Ok(());
    }

    // Start status server (unless disabled or in --once mode)
    if !args.no_status_server && !args.once {
        let server_state = Arc::new(ServerState {
            status: status.clone(),
            started_at: Utc::now(),
        });
        let status_port = args.status_port;
        tokio::spawn(async move {
            if let Err(e) = server::run_server(server_state, status_port).await {
                tracing::error!(error = %e, "Status server failed");
            }
        });
    }

    if args.once {
        info!(families = scheduler.family_count(), "Running single pass");
        scheduler.run_once().await;
    } else {
        info!(
            families = scheduler.family_count(),
            poll_interval_secs = config.poll_interval_secs,
            "Starting continuous polling"
        );

        // Shutdown signal
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        // Handle Ctrl+C
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            shutdown_tx.send(()).ok();
        });

        scheduler.run_forever(shutdown_rx).await?;
    }

    let families = status.snapshot().await;
    let failed = families.iter().filter(|f| f.last_error.is_some()).count();
    let sweeps: u64 = families
        .iter()
        .filter_map(|f| f.last_summary.as_ref())
        .map(|s| s.sweeps)
        .sum();
    info!(
        families = families.len(),
        failed_families = failed,
        sweeps,
        duration_minutes = started.elapsed().as_secs_f64() / 60.0,
        "Ingestion session complete"
    );

    Ok(())
}
