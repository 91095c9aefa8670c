//! Completion notifications.
//!
//! The analysis service publishes a JSON completion message to a topic, which
//! is delivered to a queue wrapped in the topic's envelope. Both layers are
//! JSON, so the payload is parsed twice.

mod sqs;

use async_trait::async_trait;
use serde::Deserialize;

use crate::aws::AwsError;

pub use sqs::SqsQueue;

/// The topic delivery envelope. Only the inner message matters here.
#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Message")]
    message: String,
}

/// A job completion notification, as published by the analysis service.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCompletion {
    #[serde(rename = "JobId")]
    pub job_id: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "API", default)]
    pub api: Option<String>,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<i64>,
}

/// Parse a queue message body into a completion notification.
///
/// Bodies normally arrive wrapped in the topic envelope; bare completion
/// payloads are accepted too for queues subscribed with raw delivery.
pub fn parse_completion(body: &str) -> Result<JobCompletion, serde_json::Error> {
    match serde_json::from_str::<SnsEnvelope>(body) {
        Ok(envelope) => serde_json::from_str(&envelope.message),
        Err(_) => serde_json::from_str(body),
    }
}

/// A message received from the completion queue.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

/// The queue operations the listener uses.
#[async_trait]
pub trait CompletionQueue: Send + Sync {
    /// Long-poll for up to `max` messages.
    async fn receive(&self, max: u32, wait_seconds: u32) -> Result<Vec<QueueMessage>, AwsError>;

    /// Delete a handled message.
    async fn delete(&self, receipt_handle: &str) -> Result<(), AwsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enveloped_completion() {
        let inner = r#"{"JobId":"job-1","Status":"SUCCEEDED","API":"StartDocumentAnalysis","Timestamp":1700000000000}"#;
        let body = serde_json::json!({
            "Type": "Notification",
            "MessageId": "m-1",
            "Message": inner,
        })
        .to_string();

        let completion = parse_completion(&body).unwrap();
        assert_eq!(completion.job_id, "job-1");
        assert_eq!(completion.status, "SUCCEEDED");
        assert_eq!(completion.api.as_deref(), Some("StartDocumentAnalysis"));
    }

    #[test]
    fn parses_raw_completion() {
        let body = r#"{"JobId":"job-2","Status":"FAILED"}"#;
        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.job_id, "job-2");
        assert_eq!(completion.status, "FAILED");
        assert!(completion.api.is_none());
    }

    #[test]
    fn rejects_unrelated_json() {
        assert!(parse_completion(r#"{"hello":"world"}"#).is_err());
    }
}
