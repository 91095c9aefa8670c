//! Job records for the tracking table.
//!
//! One row per analysis job, keyed by the correlation id the analysis
//! service issues. Status is monotonic: `IN_PROGRESS` moves to exactly one
//! terminal state and never back. Rows are never deleted by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a tracked analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Submitted, no terminal notification processed yet.
    InProgress,
    /// Result document written successfully.
    Completed,
    /// Terminal failure. The field carries the stored form, e.g.
    /// `FAILED_PARTIAL_SUCCESS` or `FAILED_EXPIRED`.
    Failed(String),
}

impl JobStatus {
    /// Stored string form, matching the table's historical values.
    pub fn as_field(&self) -> String {
        match self {
            Self::InProgress => "IN_PROGRESS".to_string(),
            Self::Completed => "COMPLETED".to_string(),
            Self::Failed(s) => s.clone(),
        }
    }

    /// Parse the stored string form. Anything starting with `FAILED` is a
    /// failure; unknown strings are treated as failures rather than dropped.
    pub fn from_field(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            other => Self::Failed(other.to_string()),
        }
    }

    /// Failure status for a non-succeeded service status, e.g. `FAILED` or
    /// `PARTIAL_SUCCESS` from the notification payload.
    pub fn failed_from_service(service_status: &str) -> Self {
        Self::Failed(format!("FAILED_{}", service_status))
    }

    /// Terminal status for a job whose results expired before recovery.
    pub fn failed_expired() -> Self {
        Self::Failed("FAILED_EXPIRED".to_string())
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// One analysis job, as stored in the tracking table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Correlation id issued by the analysis service.
    pub job_id: String,
    /// Key of the source PDF.
    pub source_key: String,
    /// Bucket the source PDF lives in.
    pub bucket: String,
    /// Batch prefix the file was submitted from, e.g. `batch-1/`.
    pub batch_prefix: String,
    /// Current status.
    pub status: JobStatus,
    /// When the job was started.
    pub started_at: DateTime<Utc>,
    /// When the job reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Key of the written result document, once completed.
    pub output_key: Option<String>,
}

impl JobRecord {
    /// A freshly submitted job.
    pub fn started(job_id: String, source_key: String, bucket: String, batch_prefix: String) -> Self {
        Self {
            job_id,
            source_key,
            bucket,
            batch_prefix,
            status: JobStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            output_key: None,
        }
    }

    /// Filename portion of the source key.
    pub fn source_filename(&self) -> &str {
        self.source_key.rsplit('/').next().unwrap_or(&self.source_key)
    }

    /// Result-document filename: source filename with `.pdf` swapped for
    /// `.json` (appended when the source had no `.pdf` suffix).
    pub fn result_filename(&self) -> String {
        let name = self.source_filename();
        match name.strip_suffix(".pdf") {
            Some(stem) => format!("{}.json", stem),
            None => format!("{}.json", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_field_form() {
        for status in [
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::failed_from_service("PARTIAL_SUCCESS"),
            JobStatus::failed_expired(),
        ] {
            assert_eq!(JobStatus::from_field(&status.as_field()), status);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::failed_expired().is_terminal());
    }

    #[test]
    fn result_filename_replaces_pdf_suffix() {
        let job = JobRecord::started(
            "j1".into(),
            "batch-1/report.pdf".into(),
            "b".into(),
            "batch-1/".into(),
        );
        assert_eq!(job.source_filename(), "report.pdf");
        assert_eq!(job.result_filename(), "report.json");
    }

    #[test]
    fn result_filename_without_pdf_suffix() {
        let job = JobRecord::started("j1".into(), "scan.tiff".into(), "b".into(), "".into());
        assert_eq!(job.result_filename(), "scan.tiff.json");
    }
}
