//! JSON manifest of already-ingested files.
//!
//! The manifest maps each file identifier to `{"sweeps": n}` and is the
//! dedup ground truth between runs. It is read once at the start of a pass
//! and written once at the end, after all fan-out work has finished.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use radar_common::{ManifestEntry, RadarError, RadarResult};

/// Identifier -> entry, ordered for stable output.
pub type Manifest = BTreeMap<String, ManifestEntry>;

/// Right-biased merge: entries in `updates` overwrite those in `existing`.
pub fn merge(existing: Manifest, updates: Manifest) -> Manifest {
    let mut merged = existing;
    merged.extend(updates);
    merged
}

/// File-backed manifest.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest; a missing file is an empty manifest.
    pub fn load(&self) -> RadarResult<Manifest> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No manifest yet, starting empty");
                return Ok(Manifest::new());
            }
            Err(e) => {
                return Err(RadarError::ManifestIo(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Manifest::new());
        }

        serde_json::from_slice(&data)
            .map_err(|e| RadarError::ManifestIo(format!("{}: {}", self.path.display(), e)))
    }

    /// Write the whole manifest.
    ///
    /// The JSON is written to a temporary file in the same directory and
    /// renamed over the target, so a crash never leaves a torn manifest.
    #[instrument(skip(self, manifest), fields(path = %self.path.display(), entries = manifest.len()))]
    pub fn save(&self, manifest: &Manifest) -> RadarResult<()> {
        let io_err = |e: std::io::Error| RadarError::ManifestIo(format!("{}: {}", self.path.display(), e));

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        serde_json::to_writer_pretty(&mut tmp, manifest)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        info!("Manifest saved");
        Ok(())
    }

    /// Load, merge `updates` over the current content, and save.
    pub fn merge_and_save(&self, updates: Manifest) -> RadarResult<Manifest> {
        let merged = merge(self.load()?, updates);
        self.save(&merged)?;
        Ok(merged)
    }
}

/// Split an artifact file name `<identifier>_<product>_idx<n>.<ext>`.
///
/// Returns the identifier and sweep index when the name belongs to
/// `product` and has extension `ext`.
pub fn parse_artifact_name<'a>(name: &'a str, product: &str, ext: &str) -> Option<(&'a str, usize)> {
    let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
    let (head, index) = stem.rsplit_once("_idx")?;
    let index = index.parse().ok()?;
    let identifier = head.strip_suffix(product)?.strip_suffix('_')?;
    if identifier.is_empty() {
        return None;
    }
    Some((identifier, index))
}

/// Rebuild a manifest by scanning rendered metadata files in `dir`.
///
/// Each identifier's sweep count is the number of `<identifier>_<product>_idx<n>.json`
/// files present. A missing directory yields an empty manifest.
#[instrument(fields(dir = %dir.display()))]
pub fn rebuild_from_artifacts(dir: &Path, product: &str) -> RadarResult<Manifest> {
    let mut manifest = Manifest::new();
    if !dir.exists() {
        return Ok(manifest);
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| RadarError::Storage(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some((identifier, _)) = parse_artifact_name(&name, product, "json") {
            manifest
                .entry(identifier.to_string())
                .or_insert(ManifestEntry::new(0))
                .sweeps += 1;
        }
    }

    debug!(entries = manifest.len(), "Rebuilt manifest from artifacts");
    Ok(manifest)
}
