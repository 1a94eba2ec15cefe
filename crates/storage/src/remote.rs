//! The remote object-store contract.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use radar_common::RadarResult;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Object keys on this page, in store order
    pub keys: Vec<String>,
    /// Token for the next page; `None` once the listing is exhausted
    pub next_token: Option<String>,
}

/// Read-only access to a bucket of radar products.
///
/// Implementations must be `Send + Sync`: a single instance is created at
/// startup and shared by reference across every concurrent listing and
/// fetch of a run.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Bucket this store reads from.
    fn bucket(&self) -> &str;

    /// List one page of keys under `prefix`, continuing from `continuation`.
    ///
    /// Errors are reported as `RadarError::Discovery`.
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> RadarResult<ListPage>;

    /// Retrieve the full contents of `key`.
    ///
    /// Errors are reported as `RadarError::Fetch`.
    async fn get(&self, key: &str) -> RadarResult<Bytes>;

    /// List every key under `prefix`, draining pagination.
    ///
    /// Empty pages are tolerated; the listing only stops when no
    /// continuation token is returned.
    async fn list_all(&self, prefix: &str) -> RadarResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.list_page(prefix, token.as_deref()).await?;
            pages += 1;
            keys.extend(page.keys);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(bucket = %self.bucket(), prefix = %prefix, pages, count = keys.len(), "Listed prefix");
        Ok(keys)
    }
}
