//! Export command.

use std::path::Path;

use console::style;

use crate::pipeline::export;

/// Export downloaded result documents to CSV views for review.
pub async fn cmd_export(input: &Path, dest: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!(
            "input directory not found: {}\n  Run the download command first",
            input.display()
        );
    }

    let entries = export::collect_documents(input)?;
    if entries.is_empty() {
        println!(
            "{} No result documents under {}",
            style("!").yellow(),
            input.display()
        );
        return Ok(());
    }

    let written = export::export_documents(&entries, dest)?;
    for path in &written {
        println!("  {} {}", style("✓").green(), path.display());
    }
    println!(
        "{} Exported {} documents",
        style("✓").green(),
        entries.len()
    );
    Ok(())
}
