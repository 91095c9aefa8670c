//! Object storage seam.
//!
//! The pipeline only needs a handful of object operations; they sit behind a
//! trait so the orchestration services can be driven against in-memory
//! stand-ins in tests.

mod s3;

use async_trait::async_trait;

use crate::aws::AwsError;

pub use s3::S3Store;

/// A stored object, as returned by listings.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}

/// The object-store operations the pipeline uses.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object under `prefix` (empty prefix lists the bucket),
    /// following pagination to the end. Order is the store's listing order.
    async fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<ObjectInfo>, AwsError>;

    /// List top-level prefixes (delimiter `/`), without trailing delimiter.
    async fn list_prefixes(&self, bucket: &str) -> Result<Vec<String>, AwsError>;

    /// Fetch an object's content.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, AwsError>;

    /// Write an object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AwsError>;

    /// Server-side copy between keys (and buckets).
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), AwsError>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AwsError>;

    /// Create a bucket in the client's region.
    async fn create_bucket(&self, bucket: &str) -> Result<(), AwsError>;
}
