//! Fetch stage: copy one remote object into the staging directory.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use radar_common::{RadarError, RadarResult};
use storage::RemoteStore;

use crate::filename::base_name;

/// A remote object written to local staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub key: String,
    /// Manifest identifier, also the artifact base name
    pub identifier: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Staging path of `key`: its base name under `staging_dir`.
///
/// Keys listed in one pass have distinct base names, so concurrent fetches
/// never share a path.
pub fn staging_path(staging_dir: &Path, key: &str) -> PathBuf {
    staging_dir.join(base_name(key))
}

/// Download `key` into `staging_dir`.
///
/// Any store or filesystem error is reported as a fetch error for `key`;
/// a partially written file is removed.
#[instrument(skip(store, staging_dir), fields(bucket = %store.bucket()))]
pub async fn fetch_to_staging(
    store: &dyn RemoteStore,
    key: &str,
    identifier: &str,
    staging_dir: &Path,
) -> RadarResult<StagedFile> {
    let fetch_err = |message: String| RadarError::Fetch {
        key: key.to_string(),
        message,
    };

    let data = store.get(key).await.map_err(|e| match e {
        RadarError::Fetch { .. } => e,
        other => fetch_err(other.to_string()),
    })?;

    let path = staging_path(staging_dir, key);
    let written: std::io::Result<()> = async {
        tokio::fs::create_dir_all(staging_dir).await?;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(fetch_err(format!("writing {}: {}", path.display(), e)));
    }

    debug!(path = %path.display(), bytes = data.len(), "Staged file");
    Ok(StagedFile {
        key: key.to_string(),
        identifier: identifier.to_string(),
        path,
        size: data.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryStore;

    const KEY: &str = "2024/05/01/KPDT/KPDT20240501_091522_V06";

    #[tokio::test]
    async fn test_fetch_writes_base_name() {
        let store = InMemoryStore::new("noaa-nexrad-level2");
        store.insert(KEY, b"volume bytes".to_vec());
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("level2");

        let staged = fetch_to_staging(&store, KEY, "KPDT20240501_091522_V06", &staging)
            .await
            .unwrap();

        assert_eq!(staged.path, staging.join("KPDT20240501_091522_V06"));
        assert_eq!(staged.size, 12);
        assert_eq!(std::fs::read(&staged.path).unwrap(), b"volume bytes");
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_nothing() {
        let store = InMemoryStore::new("noaa-nexrad-level2");
        store.insert(KEY, b"volume bytes".to_vec());
        store.fail_get(KEY);
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_to_staging(&store, KEY, "KPDT20240501_091522_V06", dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "fetch");
        assert!(!staging_path(dir.path(), KEY).exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_fetch_error() {
        let store = InMemoryStore::new("noaa-nexrad-level2");
        let dir = tempfile::tempdir().unwrap();
        let err = fetch_to_staging(&store, KEY, "X", dir.path()).await.unwrap_err();
        assert!(matches!(err, RadarError::Fetch { .. }));
    }
}
