//! Document-analysis seam.
//!
//! The analysis service does the actual OCR/forms/tables work; this module
//! holds the trait the orchestration talks through, the service's block data
//! model, and the reshaping of block lists into result documents.

mod blocks;
mod extract;
mod textract;

use async_trait::async_trait;

use crate::aws::AwsError;

pub use blocks::{Block, BlockType, Relationship, RelationshipType};
pub use extract::ExtractedContent;
pub use textract::TextractAnalyzer;

/// Service job status for a successfully finished job.
pub const JOB_STATUS_SUCCEEDED: &str = "SUCCEEDED";

/// Where completion notifications for a job should go.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    pub topic_arn: String,
    pub role_arn: String,
}

/// One page of analysis results.
#[derive(Debug, Clone)]
pub struct AnalysisResults {
    /// Service-reported job status, e.g. `SUCCEEDED` or `IN_PROGRESS`.
    pub job_status: String,
    pub blocks: Vec<Block>,
    pub next_token: Option<String>,
}

/// The analysis-service operations the pipeline uses.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Start an asynchronous analysis job for one stored document and return
    /// the service-issued correlation id.
    async fn start_analysis(
        &self,
        bucket: &str,
        key: &str,
        channel: &NotificationChannel,
    ) -> Result<String, AwsError>;

    /// Fetch one page of results for a job.
    async fn get_analysis(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisResults, AwsError>;
}

/// Page through a job's results, accumulating every block.
///
/// Returns the job status from the first page together with all blocks; the
/// status on follow-up pages is the same job's and not re-checked.
pub async fn fetch_all_blocks(
    analyzer: &dyn DocumentAnalyzer,
    job_id: &str,
) -> Result<(String, Vec<Block>), AwsError> {
    let first = analyzer.get_analysis(job_id, None).await?;
    let job_status = first.job_status.clone();
    let mut blocks = first.blocks;
    let mut next_token = first.next_token;

    while let Some(token) = next_token {
        let page = analyzer.get_analysis(job_id, Some(&token)).await?;
        blocks.extend(page.blocks);
        next_token = page.next_token;
    }

    Ok((job_status, blocks))
}
