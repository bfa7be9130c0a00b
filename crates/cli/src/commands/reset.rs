//! Manual per-customer reset command.

use lumly_core::{CooldownSweeper, CustomerId};

use super::CliError;

/// Reset one customer's usage: counter to 0, marker removed.
///
/// Skips the cooldown check; this is the operator escape hatch for
/// support cases.
pub async fn run(customer: &str) -> Result<(), CliError> {
    let customer_id = CustomerId::new(customer);
    if customer_id.is_blank() {
        return Err(CliError::InvalidArgument("customer", "must not be blank".to_string()));
    }

    let (store, limits) = super::connect().await?;
    let sweeper = CooldownSweeper::new(store, limits);

    sweeper.reset_customer(&customer_id).await?;
    tracing::info!(customer = %customer_id, "Usage reset");
    Ok(())
}
