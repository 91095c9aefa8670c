//! Analyzer implementation over the Textract JSON-1.1 API.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::aws::{AwsClient, AwsError};

use super::{AnalysisResults, Block, DocumentAnalyzer, NotificationChannel};

const SERVICE: &str = "textract";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Maximum blocks requested per result page.
const MAX_RESULTS: u32 = 1000;

/// Textract-backed analyzer.
#[derive(Debug, Clone)]
pub struct TextractAnalyzer {
    client: AwsClient,
    feature_types: Vec<String>,
}

impl TextractAnalyzer {
    pub fn new(client: AwsClient, feature_types: Vec<String>) -> Self {
        Self {
            client,
            feature_types,
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for TextractAnalyzer {
    async fn start_analysis(
        &self,
        bucket: &str,
        key: &str,
        channel: &NotificationChannel,
    ) -> Result<String, AwsError> {
        let body = json!({
            "DocumentLocation": {
                "S3Object": {
                    "Bucket": bucket,
                    "Name": key,
                }
            },
            "FeatureTypes": self.feature_types,
            "NotificationChannel": {
                "SNSTopicArn": channel.topic_arn,
                "RoleArn": channel.role_arn,
            }
        });

        let response = self
            .client
            .post_target(SERVICE, "Textract.StartDocumentAnalysis", CONTENT_TYPE, &body)
            .await?;

        let job_id = response
            .get("JobId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AwsError::Decode(SERVICE.to_string(), "missing JobId in response".to_string())
            })?
            .to_string();

        debug!(bucket, key, job_id, "started analysis job");
        Ok(job_id)
    }

    async fn get_analysis(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisResults, AwsError> {
        let mut body = json!({
            "JobId": job_id,
            "MaxResults": MAX_RESULTS,
        });
        if let Some(token) = next_token {
            body["NextToken"] = json!(token);
        }

        let response = self
            .client
            .post_target(SERVICE, "Textract.GetDocumentAnalysis", CONTENT_TYPE, &body)
            .await?;

        let job_status = response
            .get("JobStatus")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AwsError::Decode(SERVICE.to_string(), "missing JobStatus in response".to_string())
            })?
            .to_string();

        let blocks: Vec<Block> = match response.get("Blocks") {
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
                AwsError::Decode(SERVICE.to_string(), format!("bad Blocks payload: {}", e))
            })?,
            None => Vec::new(),
        };

        let next_token = response
            .get("NextToken")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(AnalysisResults {
            job_status,
            blocks,
            next_token,
        })
    }
}
