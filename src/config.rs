//! Settings for the pipeline: TOML file with environment overrides.
//!
//! The settings file mirrors the configuration surface of the original
//! deployment (bucket names, batch size, service resource names, pacing).
//! Credentials are never read from the file; see [`crate::aws::Credentials`].

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "docbatch.toml";

/// Default number of files per batch.
pub const DEFAULT_BATCH_SIZE: usize = 150;

/// Default delay between successive job submissions, in milliseconds.
pub const DEFAULT_SUBMIT_DELAY_MS: u64 = 250;

/// Analysis feature types requested for every job.
pub const DEFAULT_FEATURE_TYPES: &[&str] = &["FORMS", "TABLES"];

/// On-disk shape of the settings file. All keys optional so a minimal file
/// only needs `source_bucket`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    source_bucket: Option<String>,
    output_bucket: Option<String>,
    output_prefix: Option<String>,
    region: Option<String>,
    jobs_table: Option<String>,
    batch_size: Option<usize>,
    feature_types: Option<Vec<String>>,
    sns_topic_arn: Option<String>,
    textract_role_arn: Option<String>,
    queue_url: Option<String>,
    submit_delay_ms: Option<u64>,
    endpoint_url: Option<String>,
}

/// Resolved pipeline settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bucket holding the source PDFs.
    pub source_bucket: String,
    /// Bucket result documents are written to (defaults to the source bucket).
    pub output_bucket: String,
    /// Key prefix for result documents, e.g. `processed/`.
    pub output_prefix: String,
    /// Service region.
    pub region: String,
    /// Name of the job-tracking table.
    pub jobs_table: String,
    /// Number of files per batch.
    pub batch_size: usize,
    /// Feature types requested from the analysis service.
    pub feature_types: Vec<String>,
    /// Topic the analysis service publishes completion notifications to.
    pub sns_topic_arn: Option<String>,
    /// Role the analysis service assumes to publish to the topic.
    pub textract_role_arn: Option<String>,
    /// Queue subscribed to the completion topic.
    pub queue_url: Option<String>,
    /// Delay between successive job submissions.
    pub submit_delay_ms: u64,
    /// Optional endpoint override for local S3/API-compatible stand-ins.
    pub endpoint_url: Option<String>,
}

impl Settings {
    /// Load settings from `path` (or the default file), then apply
    /// environment overrides.
    ///
    /// A missing file is an error with a remediation hint; the pipeline is
    /// useless without at least a source bucket, and silent defaults against
    /// the wrong bucket are worse than stopping.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path: PathBuf = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

        if !path.exists() {
            anyhow::bail!(
                "settings file not found: {}\n  Copy docbatch.example.toml to {} and edit it",
                path.display(),
                DEFAULT_SETTINGS_FILE
            );
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let file: SettingsFile = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;

        Self::resolve(file)
    }

    /// Merge file values with environment overrides and defaults.
    fn resolve(file: SettingsFile) -> anyhow::Result<Self> {
        let source_bucket = env_or("SOURCE_BUCKET", file.source_bucket).ok_or_else(|| {
            anyhow::anyhow!("source_bucket is not set (settings file or SOURCE_BUCKET)")
        })?;
        let output_bucket =
            env_or("OUTPUT_BUCKET", file.output_bucket).unwrap_or_else(|| source_bucket.clone());
        let output_prefix =
            env_or("OUTPUT_PREFIX", file.output_prefix).unwrap_or_else(|| "processed/".to_string());
        let region =
            env_or("AWS_REGION", file.region).unwrap_or_else(|| "us-east-1".to_string());
        let jobs_table =
            env_or("JOBS_TABLE", file.jobs_table).unwrap_or_else(|| "textract-jobs".to_string());
        let batch_size = env_parsed("BATCH_SIZE")?
            .or(file.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        let feature_types = file.feature_types.unwrap_or_else(|| {
            DEFAULT_FEATURE_TYPES.iter().map(|s| s.to_string()).collect()
        });
        let submit_delay_ms = env_parsed("SUBMIT_DELAY_MS")?
            .or(file.submit_delay_ms)
            .unwrap_or(DEFAULT_SUBMIT_DELAY_MS);

        Ok(Self {
            source_bucket,
            output_bucket,
            output_prefix,
            region,
            jobs_table,
            batch_size,
            feature_types,
            sns_topic_arn: env_or("SNS_TOPIC_ARN", file.sns_topic_arn),
            textract_role_arn: env_or("TEXTRACT_ROLE_ARN", file.textract_role_arn),
            queue_url: env_or("QUEUE_URL", file.queue_url),
            submit_delay_ms,
            endpoint_url: env_or("ENDPOINT_URL", file.endpoint_url),
        })
    }

    /// Topic ARN, or an error naming the missing key.
    pub fn require_topic_arn(&self) -> anyhow::Result<&str> {
        self.sns_topic_arn
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("sns_topic_arn is not set (settings file or SNS_TOPIC_ARN)"))
    }

    /// Notification role ARN, or an error naming the missing key.
    pub fn require_role_arn(&self) -> anyhow::Result<&str> {
        self.textract_role_arn.as_deref().ok_or_else(|| {
            anyhow::anyhow!("textract_role_arn is not set (settings file or TEXTRACT_ROLE_ARN)")
        })
    }

    /// Completion queue URL, or an error naming the missing key.
    pub fn require_queue_url(&self) -> anyhow::Result<&str> {
        self.queue_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("queue_url is not set (settings file or QUEUE_URL)"))
    }

    /// Key for a result document: `{output_prefix}{batch_prefix}{filename}`.
    ///
    /// The prefix is normalised to a single trailing slash; an empty prefix
    /// drops the segment entirely.
    pub fn output_key(&self, batch_prefix: &str, filename: &str) -> String {
        if self.output_prefix.is_empty() {
            format!("{}{}", batch_prefix, filename)
        } else {
            let prefix = self.output_prefix.trim_end_matches('/');
            format!("{}/{}{}", prefix, batch_prefix, filename)
        }
    }
}

/// `s3://bucket/key` display form.
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty()).or(fallback)
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> anyhow::Result<Option<T>> {
    match env::var(var) {
        Ok(v) if !v.is_empty() => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("environment variable {} has an invalid value: {}", var, v)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_prefix(prefix: &str) -> Settings {
        Settings {
            source_bucket: "src".into(),
            output_bucket: "out".into(),
            output_prefix: prefix.into(),
            region: "us-east-1".into(),
            jobs_table: "textract-jobs".into(),
            batch_size: DEFAULT_BATCH_SIZE,
            feature_types: vec!["FORMS".into(), "TABLES".into()],
            sns_topic_arn: None,
            textract_role_arn: None,
            queue_url: None,
            submit_delay_ms: DEFAULT_SUBMIT_DELAY_MS,
            endpoint_url: None,
        }
    }

    #[test]
    fn output_key_with_prefix() {
        let s = settings_with_prefix("processed/");
        assert_eq!(
            s.output_key("batch-1/", "doc.json"),
            "processed/batch-1/doc.json"
        );
    }

    #[test]
    fn output_key_prefix_without_slash() {
        let s = settings_with_prefix("processed");
        assert_eq!(
            s.output_key("batch-1/", "doc.json"),
            "processed/batch-1/doc.json"
        );
    }

    #[test]
    fn output_key_empty_prefix() {
        let s = settings_with_prefix("");
        assert_eq!(s.output_key("batch-1/", "doc.json"), "batch-1/doc.json");
    }

    #[test]
    fn s3_uri_format() {
        assert_eq!(s3_uri("bucket", "a/b.pdf"), "s3://bucket/a/b.pdf");
    }

    #[test]
    fn minimal_file_resolves_with_defaults() {
        let file: SettingsFile = toml::from_str("source_bucket = \"my-pdfs\"").unwrap();
        let s = Settings::resolve(file).unwrap();
        assert_eq!(s.source_bucket, "my-pdfs");
        assert_eq!(s.output_bucket, "my-pdfs");
        assert_eq!(s.output_prefix, "processed/");
        assert_eq!(s.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(s.jobs_table, "textract-jobs");
    }

    #[test]
    fn zero_batch_size_rejected() {
        let file: SettingsFile =
            toml::from_str("source_bucket = \"b\"\nbatch_size = 0").unwrap();
        assert!(Settings::resolve(file).is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<SettingsFile>("sauce_bucket = \"b\"").is_err());
    }
}
