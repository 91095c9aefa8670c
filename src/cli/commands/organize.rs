//! Organize command.

use console::style;

use crate::config::Settings;
use crate::pipeline::organize::{self, BATCH_PREFIX};
use crate::storage::ObjectStore;

use super::helpers;

/// Partition loose PDFs in the source bucket into batch prefixes.
pub async fn cmd_organize(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let store = helpers::object_store(settings)?;

    let spinner = helpers::spinner(&format!("Listing s3://{}", settings.source_bucket));
    let objects = store.list_objects(&settings.source_bucket, "").await?;
    let prefixes = store.list_prefixes(&settings.source_bucket).await?;
    spinner.finish_and_clear();

    let next_batch = organize::highest_batch_number(&prefixes)
        .map(|n| n + 1)
        .unwrap_or(1);
    let plan = organize::plan_batches(&objects, settings.batch_size, next_batch);

    if plan.batches.is_empty() {
        println!(
            "{} Nothing to organize in s3://{} ({} objects skipped)",
            style("!").yellow(),
            settings.source_bucket,
            plan.skipped
        );
        return Ok(());
    }

    println!(
        "Organizing {} PDFs into {} batches of up to {}:",
        plan.file_count(),
        plan.batches.len(),
        settings.batch_size
    );
    for batch in &plan.batches {
        println!(
            "  {} {} files",
            style(&batch.prefix).cyan(),
            batch.keys.len()
        );
    }
    if plan.skipped > 0 {
        println!("  ({} objects skipped: already batched or not PDFs)", plan.skipped);
    }

    if dry_run {
        println!("{} Dry run, nothing moved", style("!").yellow());
        return Ok(());
    }

    let bar = helpers::progress_bar(plan.file_count() as u64, "Moving files");
    for batch in &plan.batches {
        let single = organize::OrganizePlan {
            batches: vec![batch.clone()],
            skipped: 0,
        };
        organize::execute(&store, &settings.source_bucket, &single).await?;
        bar.inc(batch.keys.len() as u64);
    }
    bar.finish_and_clear();

    let last = next_batch as usize + plan.batches.len() - 1;
    println!(
        "{} Moved {} files into {}{}/ .. {}{}/",
        style("✓").green(),
        plan.file_count(),
        BATCH_PREFIX,
        next_batch,
        BATCH_PREFIX,
        last
    );
    Ok(())
}
