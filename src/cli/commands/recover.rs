//! Recover command.

use console::style;

use crate::config::Settings;
use crate::pipeline::recover;
use crate::tracking::JobStore;

use super::helpers;

/// Re-query stuck jobs and write any results the service still holds.
pub async fn cmd_recover(settings: &Settings, confirm: bool) -> anyhow::Result<()> {
    let jobs = helpers::job_store(settings)?;

    if !confirm {
        let stuck = jobs.scan_in_progress().await?;
        if stuck.is_empty() {
            println!("{} No jobs stuck in progress", style("✓").green());
            return Ok(());
        }
        println!("{} jobs still in progress:", stuck.len());
        for job in &stuck {
            println!(
                "  {} {} (started {})",
                job.job_id,
                job.source_key,
                job.started_at.format("%Y-%m-%d %H:%M")
            );
        }
        println!(
            "{} Re-run with --confirm to query these jobs and write recovered results",
            style("!").yellow()
        );
        return Ok(());
    }

    let store = helpers::object_store(settings)?;
    let analyzer = helpers::analyzer(settings)?;

    let spinner = helpers::spinner("Scanning stuck jobs");
    let outcome = recover::recover(&analyzer, &store, &jobs, settings).await?;
    spinner.finish_and_clear();

    println!(
        "{} Recovery finished: {} recovered, {} expired, {} still running, {} other, {} failed",
        style("✓").green(),
        outcome.recovered,
        outcome.expired,
        outcome.pending,
        outcome.other,
        outcome.failed
    );
    Ok(())
}
