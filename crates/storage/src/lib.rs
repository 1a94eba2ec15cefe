//! Remote object storage for radar product archives.
//!
//! Provides a unified interface for:
//! - Paginated listing of object keys by prefix
//! - Chunked retrieval of object bytes
//!
//! backed by the public S3 buckets (NOAA Level II, Unidata Level III) or an
//! in-memory store for tests.

pub mod memory;
pub mod remote;
pub mod s3;

pub use memory::InMemoryStore;
pub use remote::{ListPage, RemoteStore};
pub use s3::{RemoteStoreConfig, S3RemoteStore};
