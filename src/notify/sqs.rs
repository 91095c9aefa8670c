//! Completion queue implementation over the SQS JSON API.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::aws::{AwsClient, AwsError};

use super::{CompletionQueue, QueueMessage};

const SERVICE: &str = "sqs";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// SQS-backed completion queue.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: AwsClient,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: AwsClient, queue_url: &str) -> Self {
        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }
}

#[async_trait]
impl CompletionQueue for SqsQueue {
    async fn receive(&self, max: u32, wait_seconds: u32) -> Result<Vec<QueueMessage>, AwsError> {
        let response = self
            .client
            .post_target(
                SERVICE,
                "AmazonSQS.ReceiveMessage",
                CONTENT_TYPE,
                &json!({
                    "QueueUrl": self.queue_url,
                    "MaxNumberOfMessages": max,
                    "WaitTimeSeconds": wait_seconds,
                }),
            )
            .await?;

        let mut messages = Vec::new();
        if let Some(raw) = response.get("Messages").and_then(Value::as_array) {
            for message in raw {
                messages.push(parse_message(message)?);
            }
        }
        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), AwsError> {
        self.client
            .post_target(
                SERVICE,
                "AmazonSQS.DeleteMessage",
                CONTENT_TYPE,
                &json!({
                    "QueueUrl": self.queue_url,
                    "ReceiptHandle": receipt_handle,
                }),
            )
            .await?;
        Ok(())
    }
}

fn parse_message(raw: &Value) -> Result<QueueMessage, AwsError> {
    let field = |name: &str| {
        raw.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AwsError::Decode(
                    SERVICE.to_string(),
                    format!("message missing {}", name),
                )
            })
    };
    Ok(QueueMessage {
        message_id: field("MessageId")?,
        receipt_handle: field("ReceiptHandle")?,
        body: field("Body")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_requires_all_fields() {
        let raw = json!({
            "MessageId": "m-1",
            "ReceiptHandle": "rh-1",
            "Body": "{}",
        });
        let message = parse_message(&raw).unwrap();
        assert_eq!(message.message_id, "m-1");
        assert_eq!(message.receipt_handle, "rh-1");

        let missing = json!({"MessageId": "m-2"});
        assert!(parse_message(&missing).is_err());
    }
}
