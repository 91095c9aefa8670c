//! Provisioning of one dedicated bucket per batch.
//!
//! Some deployments give each batch its own bucket so submission limits and
//! lifecycle rules apply per batch. Bucket names carry a timestamp and a
//! random suffix so re-provisioning never collides with an earlier run.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::aws::AwsError;
use crate::storage::ObjectStore;

use super::organize::BATCH_PREFIX;

/// One provisioned batch bucket.
#[derive(Debug, Clone)]
pub struct ProvisionedBucket {
    /// Source prefix the bucket was filled from, e.g. `batch-1/`.
    pub prefix: String,
    /// Name of the created bucket.
    pub bucket: String,
    /// Number of files copied in.
    pub files: usize,
}

/// Bucket name for a batch: `batch-N-{timestamp}-{suffix}`.
///
/// The suffix is six characters of a fresh v4 uuid, which keeps names inside
/// the 63-character bucket limit while making collisions implausible.
pub fn bucket_name(prefix: &str) -> String {
    let base = prefix.trim_end_matches('/');
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("{}-{}-{}", base, timestamp, suffix)
}

/// Batch prefixes in a bucket, sorted by batch number.
pub async fn batch_prefixes(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<Vec<String>, AwsError> {
    let mut prefixes: Vec<(u32, String)> = store
        .list_prefixes(bucket)
        .await?
        .into_iter()
        .filter_map(|p| {
            let number = p.strip_prefix(BATCH_PREFIX)?.parse::<u32>().ok()?;
            Some((number, format!("{}/", p)))
        })
        .collect();
    prefixes.sort_by_key(|(number, _)| *number);
    Ok(prefixes.into_iter().map(|(_, p)| p).collect())
}

/// Create a bucket for each batch prefix and copy its files to the bucket
/// root, stripping the prefix.
pub async fn provision(
    store: &dyn ObjectStore,
    source_bucket: &str,
) -> Result<Vec<ProvisionedBucket>, AwsError> {
    let mut provisioned = Vec::new();

    for prefix in batch_prefixes(store, source_bucket).await? {
        let bucket = bucket_name(&prefix);
        store.create_bucket(&bucket).await?;

        let objects = store.list_objects(source_bucket, &prefix).await?;
        let mut files = 0;
        for object in &objects {
            let Some(dest_key) = object.key.strip_prefix(&prefix) else {
                continue;
            };
            if dest_key.is_empty() {
                continue;
            }
            store
                .copy_object(source_bucket, &object.key, &bucket, dest_key)
                .await?;
            files += 1;
        }

        info!(
            source = source_bucket,
            prefix = prefix.as_str(),
            bucket = bucket.as_str(),
            files,
            "batch bucket provisioned"
        );
        provisioned.push(ProvisionedBucket {
            prefix,
            bucket,
            files,
        });
    }

    Ok(provisioned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_name_shape() {
        let name = bucket_name("batch-3/");
        assert!(name.starts_with("batch-3-"));
        // batch-3- + 14-digit timestamp + - + 6-char suffix
        let rest = name.strip_prefix("batch-3-").unwrap();
        let (timestamp, suffix) = rest.split_once('-').unwrap();
        assert_eq!(timestamp.len(), 14);
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 6);
        assert!(name.len() <= 63);
    }

    #[test]
    fn bucket_names_do_not_collide() {
        assert_ne!(bucket_name("batch-1/"), bucket_name("batch-1/"));
    }
}
