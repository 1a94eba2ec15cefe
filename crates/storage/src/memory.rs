//! In-memory remote store used by tests and local dry runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use radar_common::{RadarError, RadarResult};

use crate::remote::{ListPage, RemoteStore};

/// A bucket held in memory.
///
/// Keys list in lexicographic order, like S3. Listing is paginated by
/// `page_size`, with the continuation token being the last key returned.
pub struct InMemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, Bytes>>,
    page_size: usize,
    failing_keys: RwLock<HashSet<String>>,
    failing_prefixes: RwLock<HashSet<String>>,
    gets: AtomicUsize,
    lists: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
            page_size: 1000,
            failing_keys: RwLock::new(HashSet::new()),
            failing_prefixes: RwLock::new(HashSet::new()),
            gets: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        }
    }

    /// Set the number of keys returned per listing page (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(key.into(), data.into());
        }
    }

    /// Make every `get` of `key` fail.
    pub fn fail_get(&self, key: impl Into<String>) {
        if let Ok(mut keys) = self.failing_keys.write() {
            keys.insert(key.into());
        }
    }

    /// Make every listing of exactly `prefix` fail.
    pub fn fail_list(&self, prefix: impl Into<String>) {
        if let Ok(mut prefixes) = self.failing_prefixes.write() {
            prefixes.insert(prefix.into());
        }
    }

    /// Number of `get` calls served so far, failed ones included.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of listing pages served so far.
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    fn poisoned(what: &str) -> RadarError {
        RadarError::Storage(format!("{} lock poisoned", what))
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> RadarResult<ListPage> {
        self.lists.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failing_prefixes
            .read()
            .map_err(|_| Self::poisoned("prefix"))?
            .contains(prefix);
        if failing {
            return Err(RadarError::Discovery {
                prefix: prefix.to_string(),
                message: "simulated listing failure".to_string(),
            });
        }

        let objects = self.objects.read().map_err(|_| Self::poisoned("object"))?;
        let mut matching = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| continuation.map_or(true, |after| key.as_str() > after))
            .cloned();

        let keys: Vec<String> = matching.by_ref().take(self.page_size).collect();
        let next_token = if matching.next().is_some() {
            keys.last().cloned()
        } else {
            None
        };

        Ok(ListPage { keys, next_token })
    }

    async fn get(&self, key: &str) -> RadarResult<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failing_keys
            .read()
            .map_err(|_| Self::poisoned("key"))?
            .contains(key);
        if failing {
            return Err(RadarError::Fetch {
                key: key.to_string(),
                message: "simulated fetch failure".to_string(),
            });
        }

        self.objects
            .read()
            .map_err(|_| Self::poisoned("object"))?
            .get(key)
            .cloned()
            .ok_or_else(|| RadarError::Fetch {
                key: key.to_string(),
                message: "NoSuchKey".to_string(),
            })
    }
}
