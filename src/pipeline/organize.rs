//! Partitioning of loose PDFs into fixed-size batch prefixes.
//!
//! Files land in the source bucket at the root; this stage moves them under
//! `batch-1/`, `batch-2/`, ... so each batch can be provisioned and submitted
//! independently. Keys already under a batch prefix are left alone, so the
//! stage is safe to re-run after a partial move.

use tracing::{debug, info};

use crate::aws::AwsError;
use crate::storage::{ObjectInfo, ObjectStore};

/// Prefix every batch directory starts with.
pub const BATCH_PREFIX: &str = "batch-";

/// One planned batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Destination prefix, e.g. `batch-1/`.
    pub prefix: String,
    /// Source keys to move into the prefix, in listing order.
    pub keys: Vec<String>,
}

/// The full partitioning plan for one bucket listing.
#[derive(Debug, Clone, Default)]
pub struct OrganizePlan {
    pub batches: Vec<BatchPlan>,
    /// Keys left out: already batched, or not PDFs.
    pub skipped: usize,
}

impl OrganizePlan {
    pub fn file_count(&self) -> usize {
        self.batches.iter().map(|b| b.keys.len()).sum()
    }
}

/// Partition a bucket listing into batches of at most `batch_size` files.
///
/// Only `.pdf` keys are batched. Keys already under a `batch-` prefix are
/// skipped. Numbering starts at `next_batch`, which callers set past any
/// existing batches.
pub fn plan_batches(objects: &[ObjectInfo], batch_size: usize, next_batch: u32) -> OrganizePlan {
    let mut plan = OrganizePlan::default();
    let mut current: Vec<String> = Vec::new();
    let mut batch_number = next_batch;

    for object in objects {
        if object.key.starts_with(BATCH_PREFIX) || !object.key.ends_with(".pdf") {
            plan.skipped += 1;
            continue;
        }
        current.push(object.key.clone());
        if current.len() == batch_size {
            plan.batches.push(BatchPlan {
                prefix: format!("{}{}/", BATCH_PREFIX, batch_number),
                keys: std::mem::take(&mut current),
            });
            batch_number += 1;
        }
    }

    if !current.is_empty() {
        plan.batches.push(BatchPlan {
            prefix: format!("{}{}/", BATCH_PREFIX, batch_number),
            keys: current,
        });
    }

    plan
}

/// Highest existing batch number in a prefix listing, if any.
///
/// Prefixes that are not `batch-N` are ignored.
pub fn highest_batch_number(prefixes: &[String]) -> Option<u32> {
    prefixes
        .iter()
        .filter_map(|p| {
            p.trim_end_matches('/')
                .strip_prefix(BATCH_PREFIX)?
                .parse::<u32>()
                .ok()
        })
        .max()
}

/// Execute a plan against the bucket: copy each file under its batch prefix,
/// then delete the original.
pub async fn execute(
    store: &dyn ObjectStore,
    bucket: &str,
    plan: &OrganizePlan,
) -> Result<(), AwsError> {
    for batch in &plan.batches {
        for key in &batch.keys {
            let filename = key.rsplit('/').next().unwrap_or(key);
            let dest = format!("{}{}", batch.prefix, filename);
            store.copy_object(bucket, key, bucket, &dest).await?;
            store.delete_object(bucket, key).await?;
            debug!(bucket, from = key.as_str(), to = dest.as_str(), "moved file");
        }
        info!(
            bucket,
            prefix = batch.prefix.as_str(),
            files = batch.keys.len(),
            "batch populated"
        );
    }
    Ok(())
}
