//! Lumly CLI - Cooldown queue administration tools.
//!
//! # Usage
//!
//! ```bash
//! # Run one sweep over the cooldown queue
//! lumly-cli sweep
//!
//! # Print the current cooldown queue
//! lumly-cli queue
//!
//! # Manually reset one customer
//! lumly-cli reset --customer 7589234001
//! ```
//!
//! # Environment Variables
//!
//! - `LUMLY_REDIS_URL` (or `REDIS_URL`) - Redis connection string
//! - `LUMLY_GENERATION_QUOTA` - Actions per customer before cooldown (default: 4)
//! - `LUMLY_COOLDOWN_MINUTES` - Cooldown before auto-reset (default: 60)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lumly-cli")]
#[command(author, version, about = "Lumly usage-limit CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sweep: reset customers whose cooldown has elapsed
    Sweep,
    /// Print the current cooldown queue
    Queue,
    /// Manually reset a customer's usage (counter to 0, marker removed)
    Reset {
        /// Customer identifier
        #[arg(short, long)]
        customer: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sweep => commands::sweep::run().await?,
        Commands::Queue => commands::queue::run().await?,
        Commands::Reset { customer } => commands::reset::run(&customer).await?,
    }
    Ok(())
}
