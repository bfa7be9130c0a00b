//! Cooldown queue inspection command.

use chrono::Utc;
use lumly_core::QueueInspector;

use super::CliError;

/// Print the current cooldown queue as a table.
#[allow(clippy::print_stdout)] // table output is this command's purpose
pub async fn run() -> Result<(), CliError> {
    let (store, limits) = super::connect().await?;
    let inspector = QueueInspector::new(store, limits);

    let report = inspector.inspect(Utc::now()).await?;

    println!(
        "{} in cooldown ({} ready for reset, {} waiting, {} malformed)",
        report.queue_length, report.ready_for_reset, report.waiting_count, report.malformed
    );

    if report.entries.is_empty() {
        return Ok(());
    }

    println!("{:<28} {:>6} {:>6} {:>12} {:>6}", "CUSTOMER", "USED", "LIMIT", "ELAPSED", "READY");
    for entry in &report.entries {
        println!(
            "{:<28} {:>6} {:>6} {:>11}m {:>6}",
            entry.customer_id,
            entry.total_used,
            entry.total_limit,
            entry.elapsed_ms / 60_000,
            if entry.ready_for_reset { "yes" } else { "no" },
        );
    }
    Ok(())
}
