//! S3 implementation of the remote store (public NOAA / Unidata buckets).

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use radar_common::{RadarError, RadarResult};

use crate::remote::{ListPage, RemoteStore};

/// Configuration for an S3 bucket connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    /// Bucket name
    pub bucket: String,
    /// AWS region of the bucket
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override (e.g. a local MinIO mirror)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Keys requested per listing page
    #[serde(default = "default_max_keys")]
    pub max_keys: i32,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_keys() -> i32 {
    1000
}

impl RemoteStoreConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: default_region(),
            endpoint: None,
            max_keys: default_max_keys(),
        }
    }
}

/// S3 client bound to one bucket.
///
/// The underlying SDK client is cheaply cloneable and safe to share across
/// tasks; requests issued concurrently are multiplexed over its connection
/// pool.
pub struct S3RemoteStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    max_keys: i32,
}

impl S3RemoteStore {
    /// Build a client for `config` using unsigned requests.
    pub async fn connect(config: &RemoteStoreConfig) -> Self {
        // Public buckets: requests are sent without credentials
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .no_credentials()
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            max_keys: config.max_keys,
        }
    }
}

/// Token for the next page, if the listing says there is one.
///
/// A truncated page without a token ends the listing early; that is logged
/// so a short listing can be traced back to the store.
fn continuation_token(prefix: &str, truncated: Option<bool>, token: Option<&str>) -> Option<String> {
    match (truncated, token) {
        (Some(true), Some(token)) => Some(token.to_string()),
        (Some(true), None) => {
            warn!(prefix = %prefix, "Listing truncated without a continuation token, stopping early");
            None
        }
        _ => None,
    }
}

#[async_trait]
impl RemoteStore for S3RemoteStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> RadarResult<ListPage> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(self.max_keys)
            .set_continuation_token(continuation.map(str::to_string))
            .send()
            .await
            .map_err(|e| RadarError::Discovery {
                prefix: prefix.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let next_token = continuation_token(
            prefix,
            response.is_truncated(),
            response.next_continuation_token(),
        );

        debug!(count = keys.len(), more = next_token.is_some(), "Listed page");
        Ok(ListPage { keys, next_token })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> RadarResult<Bytes> {
        let fetch_error = |message: String| RadarError::Fetch {
            key: key.to_string(),
            message,
        };

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| fetch_error(DisplayErrorContext(&e).to_string()))?;

        // Read the body in chunks as it arrives
        let mut body = output.body;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
        {
            buffer.extend_from_slice(&chunk);
        }

        debug!(size = buffer.len(), "Read object");
        Ok(buffer.freeze())
    }
}
