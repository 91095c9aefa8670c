//! Job-tracking seam.
//!
//! One row per analysis job lives in the managed key-value table; the
//! pipeline creates rows at submission and moves them to a terminal status
//! exactly once. Rows are never deleted here.

mod dynamo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::aws::AwsError;
use crate::models::{JobRecord, JobStatus};

pub use dynamo::DynamoJobStore;

/// The tracking-table operations the pipeline uses.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Write a new job row.
    async fn put_job(&self, job: &JobRecord) -> Result<(), AwsError>;

    /// Fetch a job row by correlation id.
    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, AwsError>;

    /// Move a row to `COMPLETED`, recording the result key.
    async fn mark_completed(
        &self,
        job_id: &str,
        output_key: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AwsError>;

    /// Move a row to a terminal failure status.
    async fn mark_failed(
        &self,
        job_id: &str,
        status: &JobStatus,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AwsError>;

    /// All rows still `IN_PROGRESS`, following scan pagination.
    async fn scan_in_progress(&self) -> Result<Vec<JobRecord>, AwsError>;

    /// Every row in the table, following scan pagination.
    async fn scan_all(&self) -> Result<Vec<JobRecord>, AwsError>;
}
