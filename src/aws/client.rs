//! Signed HTTP client for the two request shapes the pipeline needs:
//! header-targeted JSON-protocol POSTs (analysis, tracking, queue) and
//! object-store REST calls.

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::credentials::Credentials;
use super::sigv4::{self, SignableRequest, SigningContext};

/// Errors from the managed-service clients.
#[derive(Debug, Error)]
pub enum AwsError {
    #[error("credentials not found: set {0} (environment or .env file)")]
    MissingCredentials(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{service} returned {code}: {message}")]
    Api {
        service: String,
        code: String,
        message: String,
        status: u16,
    },

    #[error("unexpected response from {0}: {1}")]
    Decode(String, String),
}

impl AwsError {
    /// Service error code, when the error is an API error.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Error body shape shared by the JSON-protocol services.
#[derive(Debug, Deserialize)]
struct JsonErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Error body shape of the object store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XmlErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Thin signed client shared by all service implementations.
#[derive(Debug, Clone)]
pub struct AwsClient {
    http: reqwest::Client,
    credentials: Credentials,
    region: String,
    endpoint_override: Option<Url>,
}

impl AwsClient {
    pub fn new(
        credentials: Credentials,
        region: &str,
        endpoint_url: Option<&str>,
    ) -> Result<Self, AwsError> {
        let endpoint_override = endpoint_url
            .map(|raw| Url::parse(raw).map_err(|e| AwsError::Endpoint(format!("{}: {}", raw, e))))
            .transpose()?;

        Ok(Self {
            http: reqwest::Client::new(),
            credentials,
            region: region.to_string(),
            endpoint_override,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// POST a header-targeted JSON-protocol request, e.g.
    /// `Textract.StartDocumentAnalysis` or `DynamoDB_20120810.PutItem`.
    pub async fn post_target(
        &self,
        service: &str,
        target: &str,
        content_type: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AwsError> {
        let url = self.service_url(service)?;
        let host = host_header(&url);
        let payload = serde_json::to_vec(body)?;

        let extra_headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("x-amz-target".to_string(), target.to_string()),
        ];
        let signature = self.sign(service, "POST", &host, url.path(), &[], &extra_headers, &payload);

        let mut request = self
            .http
            .post(url)
            .header("content-type", content_type)
            .header("x-amz-target", target)
            .header("x-amz-date", &signature.amz_date)
            .header("authorization", &signature.authorization)
            .body(payload);
        if let Some(token) = &self.credentials.session_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(self.json_error(service, status.as_u16(), &bytes));
        }
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            AwsError::Decode(service.to_string(), format!("invalid JSON response: {}", e))
        })
    }

    /// Issue an object-store REST call. `key` may be empty for bucket-level
    /// operations; `query` pairs are unencoded.
    pub async fn s3_request(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        query: &[(String, String)],
        extra_headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, AwsError> {
        let (url, path) = self.s3_url(bucket, key, query)?;
        let host = host_header(&url);
        let signature = self.sign(
            "s3",
            method.as_str(),
            &host,
            &path,
            query,
            extra_headers,
            &body,
        );

        let mut request = self
            .http
            .request(method, url)
            .header("x-amz-date", &signature.amz_date)
            .header("x-amz-content-sha256", &signature.content_sha256)
            .header("authorization", &signature.authorization);
        for (name, value) in extra_headers {
            request = request.header(name, value);
        }
        if let Some(token) = &self.credentials.session_token {
            request = request.header("x-amz-security-token", token);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(self.xml_error(status.as_u16(), &bytes));
        }
        Ok(bytes.to_vec())
    }

    fn sign(
        &self,
        service: &str,
        method: &str,
        host: &str,
        path: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        payload: &[u8],
    ) -> sigv4::Signature {
        let ctx = SigningContext {
            access_key_id: &self.credentials.access_key_id,
            secret_access_key: &self.credentials.secret_access_key,
            session_token: self.credentials.session_token.as_deref(),
            region: &self.region,
            service,
            now: Utc::now(),
        };
        sigv4::sign(
            &SignableRequest {
                method,
                host,
                path,
                query,
                headers,
                payload,
            },
            &ctx,
        )
    }

    /// Endpoint for a JSON-protocol service.
    fn service_url(&self, service: &str) -> Result<Url, AwsError> {
        match &self.endpoint_override {
            Some(base) => Ok(base.clone()),
            None => {
                let raw = format!("https://{}.{}.amazonaws.com/", service, self.region);
                Url::parse(&raw).map_err(|e| AwsError::Endpoint(format!("{}: {}", raw, e)))
            }
        }
    }

    /// URL and canonical path for an object-store call. Virtual-host style
    /// against the real service, path-style against an endpoint override.
    fn s3_url(
        &self,
        bucket: &str,
        key: &str,
        query: &[(String, String)],
    ) -> Result<(Url, String), AwsError> {
        let encoded_key = sigv4::uri_encode(key, false);
        let (raw, path) = match &self.endpoint_override {
            Some(base) => {
                let base = base.as_str().trim_end_matches('/');
                let path = if key.is_empty() {
                    format!("/{}", bucket)
                } else {
                    format!("/{}/{}", bucket, encoded_key)
                };
                (format!("{}{}", base, path), path)
            }
            None => {
                let path = format!("/{}", encoded_key);
                (
                    format!("https://{}.s3.{}.amazonaws.com{}", bucket, self.region, path),
                    path,
                )
            }
        };

        let mut url =
            Url::parse(&raw).map_err(|e| AwsError::Endpoint(format!("{}: {}", raw, e)))?;
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| {
                    format!("{}={}", sigv4::uri_encode(k, true), sigv4::uri_encode(v, true))
                })
                .collect();
            url.set_query(Some(&encoded.join("&")));
        }
        Ok((url, path))
    }

    fn json_error(&self, service: &str, status: u16, body: &[u8]) -> AwsError {
        let parsed: JsonErrorBody = serde_json::from_slice(body).unwrap_or(JsonErrorBody {
            error_type: None,
            message: None,
        });
        // __type comes as "com.amazonaws.service#ExceptionName"
        let code = parsed
            .error_type
            .as_deref()
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
            .unwrap_or_else(|| format!("HTTP{}", status));
        AwsError::Api {
            service: service.to_string(),
            code,
            message: parsed.message.unwrap_or_else(|| "no message".to_string()),
            status,
        }
    }

    fn xml_error(&self, status: u16, body: &[u8]) -> AwsError {
        let text = String::from_utf8_lossy(body);
        let parsed: XmlErrorBody = quick_xml::de::from_str(&text).unwrap_or(XmlErrorBody {
            code: None,
            message: None,
        });
        AwsError::Api {
            service: "s3".to_string(),
            code: parsed.code.unwrap_or_else(|| format!("HTTP{}", status)),
            message: parsed.message.unwrap_or_else(|| "no message".to_string()),
            status,
        }
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
