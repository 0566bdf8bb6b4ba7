//! storebot CLI - Database migrations and catalog inspection.
//!
//! # Usage
//!
//! ```bash
//! # Apply conversation state migrations
//! storebot-cli migrate
//!
//! # Print the product name→id table the bot would load
//! storebot-cli catalog
//!
//! # Same, as JSON
//! storebot-cli catalog --json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "storebot-cli")]
#[command(author, version, about = "storebot operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations against `STOREBOT_DATABASE_URL`
    Migrate,
    /// Fetch and print the product catalog
    Catalog {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Catalog { json } => commands::catalog::print(json).await?,
    }
    Ok(())
}
