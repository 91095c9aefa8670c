//! Handling of finished jobs: fetch blocks, reshape, write the result
//! document, and close the tracking row.
//!
//! This path is shared by the queue listener and the recovery scan; the only
//! difference is the `recovered` provenance flag.

use chrono::Utc;
use tracing::{info, warn};

use crate::analysis::{fetch_all_blocks, Block, DocumentAnalyzer, ExtractedContent, JOB_STATUS_SUCCEEDED};
use crate::aws::AwsError;
use crate::config::Settings;
use crate::models::{DocumentMetadata, JobRecord, JobStatus};
use crate::notify::JobCompletion;
use crate::storage::ObjectStore;
use crate::tracking::JobStore;

/// What processing one completion notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Result document written, row closed.
    Completed { output_key: String },
    /// Service reported a non-success status; row closed as failed.
    Failed(String),
    /// No tracking row for the job id. The message is still deleted.
    UnknownJob,
    /// The row was already terminal; a duplicate delivery.
    AlreadyDone,
}

/// Process one completion notification end to end.
pub async fn process_completion(
    analyzer: &dyn DocumentAnalyzer,
    store: &dyn ObjectStore,
    jobs: &dyn JobStore,
    settings: &Settings,
    completion: &JobCompletion,
) -> Result<CompletionOutcome, AwsError> {
    let Some(job) = jobs.get_job(&completion.job_id).await? else {
        warn!(job_id = completion.job_id.as_str(), "notification for unknown job");
        return Ok(CompletionOutcome::UnknownJob);
    };

    if job.status.is_terminal() {
        return Ok(CompletionOutcome::AlreadyDone);
    }

    if completion.status != JOB_STATUS_SUCCEEDED {
        let status = JobStatus::failed_from_service(&completion.status);
        jobs.mark_failed(&job.job_id, &status, Utc::now()).await?;
        warn!(
            job_id = job.job_id.as_str(),
            source = job.source_key.as_str(),
            status = completion.status.as_str(),
            "job failed"
        );
        return Ok(CompletionOutcome::Failed(status.as_field()));
    }

    let (_, blocks) = fetch_all_blocks(analyzer, &job.job_id).await?;
    let output_key = store_result(store, jobs, settings, &job, &blocks, false).await?;
    Ok(CompletionOutcome::Completed { output_key })
}

/// Reshape a job's blocks into the result document, write it, and mark the
/// row completed. Returns the result key.
pub async fn store_result(
    store: &dyn ObjectStore,
    jobs: &dyn JobStore,
    settings: &Settings,
    job: &JobRecord,
    blocks: &[Block],
    recovered: bool,
) -> Result<String, AwsError> {
    let metadata = DocumentMetadata {
        source_file: job.source_key.clone(),
        bucket: job.bucket.clone(),
        batch: job.batch_prefix.clone(),
        job_id: job.job_id.clone(),
        processed_time: Utc::now().to_rfc3339(),
        total_blocks: blocks.len(),
        recovered: recovered.then_some(true),
    };
    let document = ExtractedContent::from_blocks(blocks).into_document(metadata);
    let body = document.to_json_pretty()?;

    let output_key = settings.output_key(&job.batch_prefix, &job.result_filename());
    store
        .put_object(
            &settings.output_bucket,
            &output_key,
            body.into_bytes(),
            "application/json",
        )
        .await?;
    jobs.mark_completed(&job.job_id, &output_key, Utc::now())
        .await?;

    info!(
        job_id = job.job_id.as_str(),
        source = job.source_key.as_str(),
        output = output_key.as_str(),
        recovered,
        "result written"
    );
    Ok(output_key)
}
