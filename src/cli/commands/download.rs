//! Download command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::pipeline::download;

use super::helpers;

/// Mirror result documents to a local directory.
pub async fn cmd_download(
    settings: &Settings,
    batch: Option<&str>,
    dest: &Path,
) -> anyhow::Result<()> {
    let store = helpers::object_store(settings)?;

    let spinner = helpers::spinner(&format!(
        "Downloading s3://{}/{}{}",
        settings.output_bucket,
        settings.output_prefix,
        batch.unwrap_or("")
    ));
    let outcome = download::download_results(&store, settings, batch, dest).await?;
    spinner.finish_and_clear();

    if outcome.files == 0 {
        println!("{} No results to download yet", style("!").yellow());
        return Ok(());
    }
    println!(
        "{} Downloaded {} files ({} bytes) to {}",
        style("✓").green(),
        outcome.files,
        outcome.bytes,
        dest.display()
    );
    Ok(())
}
