//! Provision command.

use console::style;

use crate::config::Settings;
use crate::pipeline::provision;

use super::helpers;

/// Create one dedicated bucket per batch prefix and copy its files in.
pub async fn cmd_provision(settings: &Settings) -> anyhow::Result<()> {
    let store = helpers::object_store(settings)?;

    let spinner = helpers::spinner("Provisioning batch buckets");
    let provisioned = provision::provision(&store, &settings.source_bucket).await?;
    spinner.finish_and_clear();

    if provisioned.is_empty() {
        println!(
            "{} No batch prefixes in s3://{}; run organize first",
            style("!").yellow(),
            settings.source_bucket
        );
        return Ok(());
    }

    for bucket in &provisioned {
        println!(
            "  {} {} -> s3://{} ({} files)",
            style("✓").green(),
            bucket.prefix,
            bucket.bucket,
            bucket.files
        );
    }
    println!(
        "{} Provisioned {} batch buckets",
        style("✓").green(),
        provisioned.len()
    );
    Ok(())
}
