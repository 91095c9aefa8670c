//! Recovery of jobs whose completion notifications were lost.
//!
//! The tracking table is scanned for rows still `IN_PROGRESS`; each job is
//! queried directly. Succeeded jobs get their result written with a
//! `recovered` provenance flag. Jobs the service no longer knows about have
//! expired (results are kept for seven days) and are closed as
//! `FAILED_EXPIRED`. Anything else is left for the next scan.

use chrono::Utc;
use tracing::{info, warn};

use crate::analysis::{fetch_all_blocks, DocumentAnalyzer, JOB_STATUS_SUCCEEDED};
use crate::aws::AwsError;
use crate::config::Settings;
use crate::models::JobStatus;
use crate::storage::ObjectStore;
use crate::tracking::JobStore;

use super::results::store_result;

/// Error code the analysis service returns for expired or bogus job ids.
const INVALID_JOB_ID: &str = "InvalidJobIdException";

/// Outcome of one recovery scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Results written on this scan.
    pub recovered: usize,
    /// Rows closed as `FAILED_EXPIRED`.
    pub expired: usize,
    /// Jobs still running, left open.
    pub pending: usize,
    /// Jobs in another service state, left open for inspection.
    pub other: usize,
    /// Jobs whose recovery errored, left open for the next scan.
    pub failed: usize,
}

/// Scan for stuck jobs and write any results the service still holds.
///
/// A failure on one job is logged and counted; the scan continues. The row
/// stays `IN_PROGRESS`, so the next scan picks it up again.
pub async fn recover(
    analyzer: &dyn DocumentAnalyzer,
    store: &dyn ObjectStore,
    jobs: &dyn JobStore,
    settings: &Settings,
) -> Result<RecoveryOutcome, AwsError> {
    let stuck = jobs.scan_in_progress().await?;
    let mut outcome = RecoveryOutcome::default();

    for job in &stuck {
        match fetch_all_blocks(analyzer, &job.job_id).await {
            Ok((status, blocks)) if status == JOB_STATUS_SUCCEEDED => {
                match store_result(store, jobs, settings, job, &blocks, true).await {
                    Ok(_) => outcome.recovered += 1,
                    Err(e) => {
                        warn!(
                            job_id = job.job_id.as_str(),
                            source = job.source_key.as_str(),
                            error = %e,
                            "recovery failed, leaving open"
                        );
                        outcome.failed += 1;
                    }
                }
            }
            Ok((status, _)) if status == "IN_PROGRESS" => {
                outcome.pending += 1;
            }
            Ok((status, _)) => {
                warn!(
                    job_id = job.job_id.as_str(),
                    source = job.source_key.as_str(),
                    status = status.as_str(),
                    "job in unexpected state, leaving open"
                );
                outcome.other += 1;
            }
            Err(e) if e.code() == Some(INVALID_JOB_ID) => {
                match jobs
                    .mark_failed(&job.job_id, &JobStatus::failed_expired(), Utc::now())
                    .await
                {
                    Ok(()) => {
                        warn!(
                            job_id = job.job_id.as_str(),
                            source = job.source_key.as_str(),
                            "job expired before recovery"
                        );
                        outcome.expired += 1;
                    }
                    Err(e) => {
                        warn!(job_id = job.job_id.as_str(), error = %e, "recovery failed, leaving open");
                        outcome.failed += 1;
                    }
                }
            }
            Err(e) => {
                warn!(
                    job_id = job.job_id.as_str(),
                    source = job.source_key.as_str(),
                    error = %e,
                    "recovery failed, leaving open"
                );
                outcome.failed += 1;
            }
        }
    }

    info!(
        scanned = stuck.len(),
        recovered = outcome.recovered,
        expired = outcome.expired,
        pending = outcome.pending,
        failed = outcome.failed,
        "recovery scan finished"
    );
    Ok(outcome)
}
