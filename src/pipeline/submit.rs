//! Submission of batch files to the analysis service.
//!
//! Each PDF under a batch prefix gets one asynchronous analysis job and one
//! tracking row. Submissions are paced to stay under the service's start
//! limit, and a single file failing does not abort the batch.

use std::time::Duration;

use tracing::{info, warn};

use crate::analysis::{DocumentAnalyzer, NotificationChannel};
use crate::aws::AwsError;
use crate::models::JobRecord;
use crate::storage::ObjectStore;
use crate::tracking::JobStore;

/// Outcome of submitting one batch.
#[derive(Debug, Clone, Default)]
pub struct SubmitOutcome {
    pub submitted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SubmitOutcome {
    pub fn merge(&mut self, other: &SubmitOutcome) {
        self.submitted += other.submitted;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Submit every PDF under `prefix` in `bucket`.
///
/// Failed starts are logged and counted; the batch continues. A delay of
/// `delay_ms` is inserted between successive starts.
pub async fn submit_batch(
    store: &dyn ObjectStore,
    analyzer: &dyn DocumentAnalyzer,
    jobs: &dyn JobStore,
    bucket: &str,
    prefix: &str,
    channel: &NotificationChannel,
    delay_ms: u64,
) -> Result<SubmitOutcome, AwsError> {
    let objects = store.list_objects(bucket, prefix).await?;
    let mut outcome = SubmitOutcome::default();
    let mut first = true;

    for object in &objects {
        if !object.key.ends_with(".pdf") {
            outcome.skipped += 1;
            continue;
        }

        if !first && delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        first = false;

        match analyzer.start_analysis(bucket, &object.key, channel).await {
            Ok(job_id) => {
                let job = JobRecord::started(
                    job_id.clone(),
                    object.key.clone(),
                    bucket.to_string(),
                    prefix.to_string(),
                );
                jobs.put_job(&job).await?;
                info!(bucket, key = object.key.as_str(), job_id = job_id.as_str(), "job submitted");
                outcome.submitted += 1;
            }
            Err(e) => {
                warn!(bucket, key = object.key.as_str(), error = %e, "submission failed");
                outcome.failed += 1;
            }
        }
    }

    info!(
        bucket,
        prefix,
        submitted = outcome.submitted,
        failed = outcome.failed,
        skipped = outcome.skipped,
        "batch submitted"
    );
    Ok(outcome)
}
