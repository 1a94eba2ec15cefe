//! Level III product-code options and their usage counts.
//!
//! The options file is keyed by product type; each entry lists a product
//! code under `value` with arbitrary display fields and a `count`:
//!
//! ```json
//! { "hydrometeor": [ { "value": "HHC", "label": "Hybrid HCA", "count": 4 } ] }
//! ```
//!
//! The same file supplies the codes to list for a product type. Counts are a
//! materialized view: recomputed wholesale from rendered artifacts after each
//! pass, never patched incrementally.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use radar_common::{RadarError, RadarResult};

use crate::filename::level3_code;
use crate::manifest::parse_artifact_name;

/// One selectable product code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeOption {
    pub value: String,
    /// Fields owned by consumers of the file, preserved as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub count: u64,
}

/// Product type -> code options.
pub type CodeOptions = BTreeMap<String, Vec<CodeOption>>;

/// File-backed code options.
#[derive(Debug, Clone)]
pub struct CodeUsageTable {
    path: PathBuf,
}

impl CodeUsageTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> RadarResult<CodeOptions> {
        match std::fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| RadarError::Config(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RadarError::Config(format!(
                "code options file not found: {}",
                self.path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Codes configured for `product`.
    pub fn codes_for(&self, product: &str) -> RadarResult<Vec<String>> {
        let options = self.load()?;
        let codes = options
            .get(product)
            .ok_or_else(|| {
                RadarError::Config(format!(
                    "no product type '{}' in {}",
                    product,
                    self.path.display()
                ))
            })?
            .iter()
            .map(|opt| opt.value.clone())
            .collect();
        Ok(codes)
    }

    /// Recompute counts for `product` from rendered artifacts in `artifact_dir`
    /// and rewrite the file.
    ///
    /// Every `<identifier>_<product>_idx0.json` counts once toward the code
    /// at the end of its identifier.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn recount(&self, artifact_dir: &Path, product: &str) -> RadarResult<CodeOptions> {
        let usage = count_codes(artifact_dir, product)?;
        let mut options = self.load()?;

        if let Some(entries) = options.get_mut(product) {
            for option in entries.iter_mut() {
                option.count = usage.get(option.value.as_str()).copied().unwrap_or(0);
            }
        }

        self.save(&options)?;
        info!(product = %product, codes = usage.len(), "Code usage recounted");
        Ok(options)
    }

    fn save(&self, options: &CodeOptions) -> RadarResult<()> {
        let io_err = |e: std::io::Error| RadarError::Storage(format!("{}: {}", self.path.display(), e));
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        serde_json::to_writer_pretty(&mut tmp, options)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// Count first-sweep artifacts per product code.
pub fn count_codes(artifact_dir: &Path, product: &str) -> RadarResult<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    if !artifact_dir.exists() {
        return Ok(counts);
    }

    for entry in WalkDir::new(artifact_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| RadarError::Storage(e.to_string()))?;
        let name = entry.file_name().to_string_lossy();
        let code = parse_artifact_name(&name, product, "json")
            .filter(|(_, index)| *index == 0)
            .and_then(|(identifier, _)| level3_code(identifier));
        if let Some(code) = code {
            *counts.entry(code.to_string()).or_insert(0) += 1;
        }
    }

    debug!(product = %product, ?counts, "Counted product codes");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_options(dir: &Path) -> PathBuf {
        let path = dir.join("options.json");
        let options = json!({
            "hydrometeor": [
                { "value": "HHC", "label": "Hybrid Hydrometeor Classification", "count": 99 },
                { "value": "N0H", "label": "Hydrometeor Classification" }
            ],
            "precipitation": [
                { "value": "DPR", "label": "Digital Precipitation Rate", "count": 1 }
            ]
        });
        std::fs::write(&path, options.to_string()).unwrap();
        path
    }

    #[test]
    fn test_codes_for_product() {
        let dir = tempfile::tempdir().unwrap();
        let table = CodeUsageTable::new(write_options(dir.path()));
        assert_eq!(table.codes_for("hydrometeor").unwrap(), vec!["HHC", "N0H"]);
        assert_eq!(table.codes_for("precipitation").unwrap(), vec!["DPR"]);
        assert!(matches!(table.codes_for("velocity"), Err(RadarError::Config(_))));
    }

    #[test]
    fn test_missing_options_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let table = CodeUsageTable::new(dir.path().join("absent.json"));
        assert!(matches!(table.load(), Err(RadarError::Config(_))));
    }

    #[test]
    fn test_recount_preserves_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let table = CodeUsageTable::new(write_options(dir.path()));

        let plots = dir.path().join("plots");
        std::fs::create_dir_all(&plots).unwrap();
        for name in [
            "KPDT20240501_091522_HHC_hydrometeor_idx0.json",
            "KPDT20240501_092022_HHC_hydrometeor_idx0.json",
            "KPDT20240501_092022_HHC_hydrometeor_idx0.png",
            "KPDT20240501_092022_HHC_hydrometeor_idx1.json",
            "KPDT20240501_091522_DPR_precipitation_idx0.json",
        ] {
            std::fs::write(plots.join(name), "{}").unwrap();
        }

        let options = table.recount(&plots, "hydrometeor").unwrap();
        let hydro = &options["hydrometeor"];
        assert_eq!(hydro[0].count, 2);
        assert_eq!(hydro[1].count, 0);
        assert_eq!(hydro[0].extra["label"], "Hybrid Hydrometeor Classification");

        // Other product types are untouched
        assert_eq!(options["precipitation"][0].count, 1);

        let reloaded = table.load().unwrap();
        assert_eq!(reloaded, options);
    }
}
