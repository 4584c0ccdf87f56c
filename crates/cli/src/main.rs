//! Outreach CLI - Database migrations and campaign tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! outreach migrate
//!
//! # Seed customers and campaigns
//! outreach seed fixtures/demo.yaml
//!
//! # Preview and send a campaign
//! outreach campaign audience 0b7e2f7a-5f55-4a53-8d3b-0d2a1f6c9e11
//! outreach campaign send 0b7e2f7a-5f55-4a53-8d3b-0d2a1f6c9e11
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "outreach")]
#[command(author, version, about = "Outreach CRM CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert customers and campaigns from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
    /// Inspect or send campaigns
    Campaign {
        #[command(subcommand)]
        action: CampaignAction,
    },
}

#[derive(Subcommand)]
enum CampaignAction {
    /// Print the customers a campaign currently resolves to
    Audience {
        /// Campaign ID
        id: String,
    },
    /// Send a campaign to its audience and mark it sent
    Send {
        /// Campaign ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "outreach=info,outreach_dispatch=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { file } => commands::seed::run(&file).await,
        Commands::Campaign { action } => match action {
            CampaignAction::Audience { id } => commands::campaign::audience(&id).await,
            CampaignAction::Send { id } => commands::campaign::send(&id).await,
        },
    }
}
