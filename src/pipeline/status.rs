//! Aggregation of tracking rows into a run summary.

use std::collections::BTreeMap;

use crate::models::{JobRecord, JobStatus};

/// Counts over every tracked job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Failure counts keyed by stored status, e.g. `FAILED_EXPIRED`.
    pub failures: BTreeMap<String, usize>,
    /// Job counts keyed by batch prefix.
    pub batches: BTreeMap<String, usize>,
}

impl StatusSummary {
    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }
}

pub fn summarize(jobs: &[JobRecord]) -> StatusSummary {
    let mut summary = StatusSummary::default();
    for job in jobs {
        summary.total += 1;
        *summary.batches.entry(job.batch_prefix.clone()).or_default() += 1;
        match &job.status {
            JobStatus::InProgress => summary.in_progress += 1,
            JobStatus::Completed => summary.completed += 1,
            JobStatus::Failed(s) => *summary.failures.entry(s.clone()).or_default() += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, prefix: &str, status: JobStatus) -> JobRecord {
        let mut job = JobRecord::started(
            id.to_string(),
            format!("{}doc.pdf", prefix),
            "b".to_string(),
            prefix.to_string(),
        );
        job.status = status;
        job
    }

    #[test]
    fn counts_by_status_and_batch() {
        let jobs = vec![
            job("1", "batch-1/", JobStatus::Completed),
            job("2", "batch-1/", JobStatus::InProgress),
            job("3", "batch-2/", JobStatus::failed_expired()),
            job("4", "batch-2/", JobStatus::failed_from_service("FAILED")),
            job("5", "batch-2/", JobStatus::failed_expired()),
        ];
        let summary = summarize(&jobs);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.failed(), 3);
        assert_eq!(summary.failures["FAILED_EXPIRED"], 2);
        assert_eq!(summary.batches["batch-2/"], 3);
    }
}
