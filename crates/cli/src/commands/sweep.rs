//! Manual sweep command.

use chrono::Utc;
use lumly_core::CooldownSweeper;

use super::CliError;

/// Run one sweep over the cooldown queue and report the summary.
pub async fn run() -> Result<(), CliError> {
    let (store, limits) = super::connect().await?;
    let sweeper = CooldownSweeper::new(store, limits);

    let summary = sweeper.sweep(Utc::now()).await?;
    tracing::info!(
        checked = summary.checked,
        reset = summary.reset,
        failed = summary.failed,
        "Sweep complete"
    );
    Ok(())
}
