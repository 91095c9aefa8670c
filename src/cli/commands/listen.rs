//! Listen command.

use console::style;
use tracing::warn;

use crate::config::Settings;
use crate::notify::{parse_completion, CompletionQueue};
use crate::pipeline::results::{process_completion, CompletionOutcome};

use super::helpers;

/// Messages requested per receive.
const RECEIVE_BATCH: u32 = 10;

/// Running totals for the drain summary. An unknown job id counts as a
/// failure: the notification cannot be matched to work, same as a failed job.
#[derive(Debug, Default)]
struct DrainStats {
    completed: usize,
    failed: usize,
}

impl DrainStats {
    fn record(&mut self, outcome: &CompletionOutcome) {
        match outcome {
            CompletionOutcome::Completed { .. } => self.completed += 1,
            CompletionOutcome::Failed(_) | CompletionOutcome::UnknownJob => self.failed += 1,
            CompletionOutcome::AlreadyDone => {}
        }
    }
}

/// Poll the completion queue and process finished jobs.
pub async fn cmd_listen(
    settings: &Settings,
    daemon: bool,
    wait: u32,
    idle_polls: u32,
) -> anyhow::Result<()> {
    let store = helpers::object_store(settings)?;
    let analyzer = helpers::analyzer(settings)?;
    let jobs = helpers::job_store(settings)?;
    let queue = helpers::completion_queue(settings)?;

    println!(
        "Listening for completions on {} ({})",
        settings.require_queue_url()?,
        if daemon { "daemon" } else { "until drained" }
    );

    let mut stats = DrainStats::default();
    let mut idle = 0u32;

    loop {
        let messages = queue.receive(RECEIVE_BATCH, wait).await?;
        if messages.is_empty() {
            idle += 1;
            if !daemon && idle >= idle_polls {
                break;
            }
            continue;
        }
        idle = 0;

        for message in messages {
            let completion = match parse_completion(&message.body) {
                Ok(completion) => completion,
                Err(e) => {
                    // Not a completion payload; drop it so it cannot wedge the queue
                    warn!(message_id = message.message_id.as_str(), error = %e, "unparseable message");
                    queue.delete(&message.receipt_handle).await?;
                    continue;
                }
            };

            // Leave the message in flight on failure so the queue redelivers it
            let outcome =
                match process_completion(&analyzer, &store, &jobs, settings, &completion).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        stats.failed += 1;
                        warn!(job_id = completion.job_id.as_str(), error = %e, "processing failed");
                        continue;
                    }
                };
            stats.record(&outcome);
            match outcome {
                CompletionOutcome::Completed { output_key } => {
                    println!(
                        "  {} {} -> {}",
                        style("✓").green(),
                        completion.job_id,
                        output_key
                    );
                }
                CompletionOutcome::Failed(status) => {
                    println!(
                        "  {} {} {}",
                        style("✗").red(),
                        completion.job_id,
                        style(status).red()
                    );
                }
                CompletionOutcome::UnknownJob => {
                    println!(
                        "  {} {} not tracked, skipping",
                        style("!").yellow(),
                        completion.job_id
                    );
                }
                CompletionOutcome::AlreadyDone => {}
            }

            queue.delete(&message.receipt_handle).await?;
        }
    }

    println!(
        "{} Queue drained: {} completed, {} failed",
        style("✓").green(),
        stats.completed,
        stats.failed
    );
    Ok(())
}
