//! Job store implementation over the DynamoDB JSON-1.0 API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::aws::{AwsClient, AwsError};
use crate::models::{JobRecord, JobStatus};

use super::JobStore;

const SERVICE: &str = "dynamodb";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// DynamoDB-backed job store.
#[derive(Debug, Clone)]
pub struct DynamoJobStore {
    client: AwsClient,
    table: String,
}

impl DynamoJobStore {
    pub fn new(client: AwsClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
        }
    }

    async fn call(&self, operation: &str, body: Value) -> Result<Value, AwsError> {
        self.client
            .post_target(
                SERVICE,
                &format!("{}.{}", TARGET_PREFIX, operation),
                CONTENT_TYPE,
                &body,
            )
            .await
    }

    async fn update_status(
        &self,
        job_id: &str,
        status: &JobStatus,
        output_key: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AwsError> {
        let mut values = Map::new();
        values.insert(":status".to_string(), attr_s(&status.as_field()));
        values.insert(":time".to_string(), attr_s(&completed_at.to_rfc3339()));

        let update_expression = match output_key {
            Some(output) => {
                values.insert(":output".to_string(), attr_s(output));
                "SET #status = :status, OutputKey = :output, CompletedTime = :time"
            }
            None => "SET #status = :status, CompletedTime = :time",
        };

        self.call(
            "UpdateItem",
            json!({
                "TableName": self.table,
                "Key": {"JobId": attr_s(job_id)},
                "UpdateExpression": update_expression,
                "ExpressionAttributeNames": {"#status": "Status"},
                "ExpressionAttributeValues": values,
            }),
        )
        .await?;
        Ok(())
    }

    /// Scan the table, optionally filtered to one status, following
    /// `LastEvaluatedKey` pagination.
    async fn scan(&self, status_filter: Option<&str>) -> Result<Vec<JobRecord>, AwsError> {
        let mut jobs = Vec::new();
        let mut exclusive_start_key: Option<Value> = None;

        loop {
            let mut body = json!({"TableName": self.table});
            if let Some(status) = status_filter {
                body["FilterExpression"] = json!("#s = :status");
                body["ExpressionAttributeNames"] = json!({"#s": "Status"});
                body["ExpressionAttributeValues"] = json!({":status": attr_s(status)});
            }
            if let Some(start_key) = &exclusive_start_key {
                body["ExclusiveStartKey"] = start_key.clone();
            }

            let response = self.call("Scan", body).await?;
            if let Some(items) = response.get("Items").and_then(Value::as_array) {
                for item in items {
                    jobs.push(parse_job(item)?);
                }
            }

            match response.get("LastEvaluatedKey") {
                Some(key) if !key.is_null() => exclusive_start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(jobs)
    }
}

#[async_trait]
impl JobStore for DynamoJobStore {
    async fn put_job(&self, job: &JobRecord) -> Result<(), AwsError> {
        let mut item = Map::new();
        item.insert("JobId".to_string(), attr_s(&job.job_id));
        item.insert("SourceKey".to_string(), attr_s(&job.source_key));
        item.insert("Bucket".to_string(), attr_s(&job.bucket));
        item.insert("BatchPrefix".to_string(), attr_s(&job.batch_prefix));
        item.insert("Status".to_string(), attr_s(&job.status.as_field()));
        item.insert("StartTime".to_string(), attr_s(&job.started_at.to_rfc3339()));
        if let Some(completed_at) = job.completed_at {
            item.insert(
                "CompletedTime".to_string(),
                attr_s(&completed_at.to_rfc3339()),
            );
        }
        if let Some(output_key) = &job.output_key {
            item.insert("OutputKey".to_string(), attr_s(output_key));
        }

        self.call(
            "PutItem",
            json!({"TableName": self.table, "Item": Value::Object(item)}),
        )
        .await?;
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, AwsError> {
        let response = self
            .call(
                "GetItem",
                json!({
                    "TableName": self.table,
                    "Key": {"JobId": attr_s(job_id)},
                    "ConsistentRead": true,
                }),
            )
            .await?;

        match response.get("Item") {
            Some(item) if !item.is_null() => Ok(Some(parse_job(item)?)),
            _ => Ok(None),
        }
    }

    async fn mark_completed(
        &self,
        job_id: &str,
        output_key: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AwsError> {
        self.update_status(job_id, &JobStatus::Completed, Some(output_key), completed_at)
            .await
    }

    async fn mark_failed(
        &self,
        job_id: &str,
        status: &JobStatus,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AwsError> {
        self.update_status(job_id, status, None, completed_at).await
    }

    async fn scan_in_progress(&self) -> Result<Vec<JobRecord>, AwsError> {
        self.scan(Some("IN_PROGRESS")).await
    }

    async fn scan_all(&self) -> Result<Vec<JobRecord>, AwsError> {
        self.scan(None).await
    }
}

/// String attribute value.
fn attr_s(value: &str) -> Value {
    json!({"S": value})
}

/// Read a string attribute from an item.
fn get_s(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .and_then(|attr| attr.get("S"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn require_s(item: &Value, field: &str) -> Result<String, AwsError> {
    get_s(item, field).ok_or_else(|| {
        AwsError::Decode(
            SERVICE.to_string(),
            format!("item missing string attribute {}", field),
        )
    })
}

fn parse_time(raw: &str, field: &str) -> Result<DateTime<Utc>, AwsError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            AwsError::Decode(
                SERVICE.to_string(),
                format!("item has invalid {}: {} ({})", field, raw, e),
            )
        })
}

fn parse_job(item: &Value) -> Result<JobRecord, AwsError> {
    let started_at = parse_time(&require_s(item, "StartTime")?, "StartTime")?;
    let completed_at = match get_s(item, "CompletedTime") {
        Some(raw) => Some(parse_time(&raw, "CompletedTime")?),
        None => None,
    };

    Ok(JobRecord {
        job_id: require_s(item, "JobId")?,
        source_key: require_s(item, "SourceKey")?,
        bucket: require_s(item, "Bucket")?,
        batch_prefix: require_s(item, "BatchPrefix")?,
        status: JobStatus::from_field(&require_s(item, "Status")?),
        started_at,
        completed_at,
        output_key: get_s(item, "OutputKey"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_job_reads_required_and_optional_fields() {
        let item = json!({
            "JobId": {"S": "job-1"},
            "SourceKey": {"S": "batch-1/a.pdf"},
            "Bucket": {"S": "pdfs"},
            "BatchPrefix": {"S": "batch-1/"},
            "Status": {"S": "COMPLETED"},
            "StartTime": {"S": "2026-01-01T00:00:00+00:00"},
            "CompletedTime": {"S": "2026-01-01T00:05:00+00:00"},
            "OutputKey": {"S": "processed/batch-1/a.json"},
        });
        let job = parse_job(&item).unwrap();
        assert_eq!(job.job_id, "job-1");
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());
        assert_eq!(job.output_key.as_deref(), Some("processed/batch-1/a.json"));
    }

    #[test]
    fn parse_job_without_terminal_fields() {
        let item = json!({
            "JobId": {"S": "job-2"},
            "SourceKey": {"S": "b.pdf"},
            "Bucket": {"S": "pdfs"},
            "BatchPrefix": {"S": "batch-2/"},
            "Status": {"S": "IN_PROGRESS"},
            "StartTime": {"S": "2026-01-01T00:00:00+00:00"},
        });
        let job = parse_job(&item).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(job.completed_at.is_none());
        assert!(job.output_key.is_none());
    }

    #[test]
    fn parse_job_missing_field_is_an_error() {
        let item = json!({"JobId": {"S": "job-3"}});
        assert!(parse_job(&item).is_err());
    }
}
