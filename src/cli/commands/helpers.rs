//! Shared construction of service clients from settings.

use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::{NotificationChannel, TextractAnalyzer};
use crate::aws::{AwsClient, Credentials};
use crate::config::Settings;
use crate::notify::SqsQueue;
use crate::storage::S3Store;
use crate::tracking::DynamoJobStore;

/// A signed API client for the configured region and endpoint.
pub fn aws_client(settings: &Settings) -> anyhow::Result<AwsClient> {
    let credentials = Credentials::from_env()?;
    Ok(AwsClient::new(
        credentials,
        &settings.region,
        settings.endpoint_url.as_deref(),
    )?)
}

pub fn object_store(settings: &Settings) -> anyhow::Result<S3Store> {
    Ok(S3Store::new(aws_client(settings)?))
}

pub fn analyzer(settings: &Settings) -> anyhow::Result<TextractAnalyzer> {
    Ok(TextractAnalyzer::new(
        aws_client(settings)?,
        settings.feature_types.clone(),
    ))
}

pub fn job_store(settings: &Settings) -> anyhow::Result<DynamoJobStore> {
    Ok(DynamoJobStore::new(
        aws_client(settings)?,
        &settings.jobs_table,
    ))
}

pub fn completion_queue(settings: &Settings) -> anyhow::Result<SqsQueue> {
    Ok(SqsQueue::new(
        aws_client(settings)?,
        settings.require_queue_url()?,
    ))
}

/// The notification channel jobs publish completions through.
pub fn notification_channel(settings: &Settings) -> anyhow::Result<NotificationChannel> {
    Ok(NotificationChannel {
        topic_arn: settings.require_topic_arn()?.to_string(),
        role_arn: settings.require_role_arn()?.to_string(),
    })
}

/// Spinner for operations without a known length.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

/// Progress bar for a known number of steps.
pub fn progress_bar(len: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    bar.set_message(message.to_string());
    bar
}
