//! Local mirroring of result documents.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Settings;
use crate::storage::ObjectStore;

/// Outcome of one download run.
#[derive(Debug, Clone, Default)]
pub struct DownloadOutcome {
    pub files: usize,
    pub bytes: u64,
}

/// Mirror everything under the output prefix into `dest`, preserving the
/// batch directory structure below the prefix. A batch prefix such as
/// `batch-1/` restricts the mirror to that batch.
pub async fn download_results(
    store: &dyn ObjectStore,
    settings: &Settings,
    batch: Option<&str>,
    dest: &Path,
) -> anyhow::Result<DownloadOutcome> {
    let list_prefix = match batch {
        Some(batch) => format!("{}{}", settings.output_prefix, batch),
        None => settings.output_prefix.clone(),
    };
    let objects = store
        .list_objects(&settings.output_bucket, &list_prefix)
        .await?;
    let mut outcome = DownloadOutcome::default();

    for object in &objects {
        let relative = object
            .key
            .strip_prefix(&settings.output_prefix)
            .unwrap_or(&object.key)
            .trim_start_matches('/');
        if relative.is_empty() {
            continue;
        }

        let body = store.get_object(&settings.output_bucket, &object.key).await?;
        let path = dest.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &body)?;

        debug!(key = object.key.as_str(), path = %path.display(), "downloaded");
        outcome.files += 1;
        outcome.bytes += body.len() as u64;
    }

    info!(
        bucket = settings.output_bucket.as_str(),
        prefix = settings.output_prefix.as_str(),
        files = outcome.files,
        bytes = outcome.bytes,
        "results downloaded"
    );
    Ok(outcome)
}
