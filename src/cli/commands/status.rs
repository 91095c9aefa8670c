//! Status command.

use console::style;

use crate::config::Settings;
use crate::pipeline::status;
use crate::tracking::JobStore;

use super::helpers;

/// Summarize every tracked job.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let jobs = helpers::job_store(settings)?;

    let spinner = helpers::spinner(&format!("Scanning {}", settings.jobs_table));
    let rows = jobs.scan_all().await?;
    spinner.finish_and_clear();

    if rows.is_empty() {
        println!("{} No tracked jobs", style("!").yellow());
        return Ok(());
    }

    let summary = status::summarize(&rows);
    println!("Jobs: {}", summary.total);
    println!("  {} completed:   {}", style("✓").green(), summary.completed);
    println!("  {} in progress: {}", style("…").cyan(), summary.in_progress);
    println!("  {} failed:      {}", style("✗").red(), summary.failed());
    for (status, count) in &summary.failures {
        println!("      {}: {}", status, count);
    }

    println!("By batch:");
    for (batch, count) in &summary.batches {
        println!("  {} {}", batch, count);
    }

    // Most recent failures, newest first
    let mut failed: Vec<_> = rows
        .iter()
        .filter(|r| matches!(r.status, crate::models::JobStatus::Failed(_)))
        .collect();
    failed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    if !failed.is_empty() {
        println!("Recent failures:");
        for job in failed.iter().take(5) {
            println!(
                "  {} {} ({})",
                job.job_id,
                job.source_key,
                job.status.as_field()
            );
        }
    }
    Ok(())
}
