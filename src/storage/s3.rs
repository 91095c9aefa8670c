//! Object store implementation over the S3 REST API.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::aws::{sigv4, AwsClient, AwsError};

use super::{ObjectInfo, ObjectStore};

/// S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: AwsClient,
}

/// ListObjectsV2 response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
    #[serde(default, rename = "Contents")]
    contents: Vec<ListEntry>,
    #[serde(default, rename = "CommonPrefixes")]
    common_prefixes: Vec<CommonPrefix>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListEntry {
    key: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommonPrefix {
    prefix: String,
}

impl S3Store {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }

    /// One ListObjectsV2 page.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ListBucketResult, AwsError> {
        let mut query: Vec<(String, String)> =
            vec![("list-type".to_string(), "2".to_string())];
        if !prefix.is_empty() {
            query.push(("prefix".to_string(), prefix.to_string()));
        }
        if let Some(delimiter) = delimiter {
            query.push(("delimiter".to_string(), delimiter.to_string()));
        }
        if let Some(token) = continuation_token {
            query.push(("continuation-token".to_string(), token.to_string()));
        }

        let body = self
            .client
            .s3_request(Method::GET, bucket, "", &query, &[], Vec::new())
            .await?;
        let text = String::from_utf8_lossy(&body);
        quick_xml::de::from_str(&text)
            .map_err(|e| AwsError::Decode("s3".to_string(), format!("bad listing XML: {}", e)))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, AwsError> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .list_page(bucket, prefix, None, token.as_deref())
                .await?;
            objects.extend(page.contents.into_iter().map(|entry| ObjectInfo {
                key: entry.key,
                size: entry.size,
            }));
            if page.is_truncated {
                token = page.next_continuation_token;
                if token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        debug!(bucket, prefix, count = objects.len(), "listed objects");
        Ok(objects)
    }

    async fn list_prefixes(&self, bucket: &str) -> Result<Vec<String>, AwsError> {
        let mut prefixes = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.list_page(bucket, "", Some("/"), token.as_deref()).await?;
            prefixes.extend(
                page.common_prefixes
                    .into_iter()
                    .map(|p| p.prefix.trim_end_matches('/').to_string()),
            );
            if page.is_truncated {
                token = page.next_continuation_token;
                if token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(prefixes)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, AwsError> {
        self.client
            .s3_request(Method::GET, bucket, key, &[], &[], Vec::new())
            .await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AwsError> {
        let headers = vec![("content-type".to_string(), content_type.to_string())];
        self.client
            .s3_request(Method::PUT, bucket, key, &[], &headers, body)
            .await?;
        Ok(())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), AwsError> {
        let copy_source = format!(
            "/{}/{}",
            source_bucket,
            sigv4::uri_encode(source_key, false)
        );
        let headers = vec![("x-amz-copy-source".to_string(), copy_source)];
        self.client
            .s3_request(Method::PUT, dest_bucket, dest_key, &[], &headers, Vec::new())
            .await?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AwsError> {
        self.client
            .s3_request(Method::DELETE, bucket, key, &[], &[], Vec::new())
            .await?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), AwsError> {
        // us-east-1 rejects an explicit location constraint
        let body = if self.client.region() == "us-east-1" {
            Vec::new()
        } else {
            format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{}</LocationConstraint>\
                 </CreateBucketConfiguration>",
                self.client.region()
            )
            .into_bytes()
        };
        self.client
            .s3_request(Method::PUT, bucket, "", &[], &[], body)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_xml_parses_contents_and_token() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <ListBucketResult>
                <IsTruncated>true</IsTruncated>
                <NextContinuationToken>tok123</NextContinuationToken>
                <Contents><Key>batch-1/a.pdf</Key><Size>1024</Size></Contents>
                <Contents><Key>batch-1/b.pdf</Key><Size>2048</Size></Contents>
            </ListBucketResult>"#;
        let result: ListBucketResult = quick_xml::de::from_str(xml).unwrap();
        assert!(result.is_truncated);
        assert_eq!(result.next_continuation_token.as_deref(), Some("tok123"));
        assert_eq!(result.contents.len(), 2);
        assert_eq!(result.contents[0].key, "batch-1/a.pdf");
        assert_eq!(result.contents[1].size, 2048);
    }

    #[test]
    fn listing_xml_parses_common_prefixes() {
        let xml = r#"<ListBucketResult>
                <IsTruncated>false</IsTruncated>
                <CommonPrefixes><Prefix>batch-1/</Prefix></CommonPrefixes>
                <CommonPrefixes><Prefix>batch-2/</Prefix></CommonPrefixes>
            </ListBucketResult>"#;
        let result: ListBucketResult = quick_xml::de::from_str(xml).unwrap();
        assert!(!result.is_truncated);
        assert_eq!(result.common_prefixes.len(), 2);
        assert_eq!(result.common_prefixes[0].prefix, "batch-1/");
    }

    #[test]
    fn empty_listing_parses() {
        let xml = "<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>";
        let result: ListBucketResult = quick_xml::de::from_str(xml).unwrap();
        assert!(result.contents.is_empty());
        assert!(result.common_prefixes.is_empty());
    }
}
