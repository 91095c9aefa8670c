//! Submit command.

use console::style;

use crate::config::Settings;
use crate::pipeline::{provision, submit::{self, SubmitOutcome}};

use super::helpers;

/// Submit analysis jobs for one batch prefix, or for every batch.
pub async fn cmd_submit(
    settings: &Settings,
    prefix: Option<String>,
    all: bool,
) -> anyhow::Result<()> {
    let store = helpers::object_store(settings)?;
    let analyzer = helpers::analyzer(settings)?;
    let jobs = helpers::job_store(settings)?;
    let channel = helpers::notification_channel(settings)?;

    let prefixes = match (prefix, all) {
        (Some(prefix), false) => {
            let prefix = if prefix.ends_with('/') {
                prefix
            } else {
                format!("{}/", prefix)
            };
            vec![prefix]
        }
        (None, true) => provision::batch_prefixes(&store, &settings.source_bucket).await?,
        (Some(_), true) => anyhow::bail!("pass a batch prefix or --all, not both"),
        (None, false) => anyhow::bail!("pass a batch prefix (e.g. batch-1/) or --all"),
    };

    if prefixes.is_empty() {
        println!(
            "{} No batch prefixes in s3://{}; run organize first",
            style("!").yellow(),
            settings.source_bucket
        );
        return Ok(());
    }

    let mut total = SubmitOutcome::default();
    for (i, prefix) in prefixes.iter().enumerate() {
        if i > 0 && settings.submit_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(settings.submit_delay_ms)).await;
        }
        let spinner = helpers::spinner(&format!("Submitting {}", prefix));
        let outcome = submit::submit_batch(
            &store,
            &analyzer,
            &jobs,
            &settings.source_bucket,
            prefix,
            &channel,
            settings.submit_delay_ms,
        )
        .await?;
        spinner.finish_and_clear();

        println!(
            "  {} {} submitted {} jobs{}",
            style("✓").green(),
            prefix,
            outcome.submitted,
            if outcome.failed > 0 {
                format!(" ({} {})", outcome.failed, style("failed").red())
            } else {
                String::new()
            }
        );
        total.merge(&outcome);
    }

    println!(
        "{} Submitted {} jobs across {} batches ({} failed, {} skipped)",
        style("✓").green(),
        total.submitted,
        prefixes.len(),
        total.failed,
        total.skipped
    );
    Ok(())
}
