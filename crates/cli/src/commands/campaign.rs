//! Campaign commands.
//!
//! # Usage
//!
//! ```bash
//! # Show who a campaign would reach right now
//! outreach campaign audience <campaign-id>
//!
//! # Send a campaign with the configured mailer
//! outreach campaign send <campaign-id>
//! ```
//!
//! `send` loads the full server configuration (`EMAIL_FROM` and the provider
//! variables) and runs the same dispatcher as
//! `POST /functions/v1/send-automated-email`.

use std::sync::Arc;

use outreach_core::CampaignId;
use outreach_dispatch::config::DispatchConfig;
use outreach_dispatch::db::{self, CampaignRepository, CustomerRepository};
use outreach_dispatch::services::{Dispatcher, RecipientStatus, build_mailer};
use outreach_dispatch::store::PgStore;

use super::{CommandError, connect};

fn parse_campaign_id(raw: &str) -> Result<CampaignId, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidId(raw.to_string()))
}

/// Print the resolved audience of a campaign.
///
/// # Errors
///
/// Returns an error if the ID is invalid, the campaign does not exist, or the
/// database is unreachable.
pub async fn audience(id: &str) -> Result<(), CommandError> {
    let id = parse_campaign_id(id)?;
    let pool = connect().await?;

    let campaign = CampaignRepository::new(&pool)
        .get(id)
        .await?
        .ok_or(db::RepositoryError::NotFound)?;
    let customers = CustomerRepository::new(&pool)
        .audience(&campaign.target_tags)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{} ({}) - {} recipient(s)",
            campaign.name,
            campaign.status,
            customers.len()
        );
        if campaign.target_tags.is_empty() {
            println!("  target tags: (all active customers)");
        } else {
            println!("  target tags: {}", campaign.target_tags.join(", "));
        }
        for customer in &customers {
            println!("  {:<40} {}", customer.email.as_str(), customer.display_name());
        }
    }
    Ok(())
}

/// Dispatch a campaign in-process.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the campaign or its
/// audience is missing, or the final status update fails.
pub async fn send(id: &str) -> Result<(), CommandError> {
    let id = parse_campaign_id(id)?;
    let config = DispatchConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    let mailer = build_mailer(&config.email)?;
    tracing::info!(provider = mailer.name(), "Sending campaign");
    let dispatcher = Dispatcher::new(Arc::new(PgStore::new(pool)), mailer);

    let response = dispatcher.send_campaign(id).await?;

    #[allow(clippy::print_stdout)]
    {
        for result in &response.results {
            let status = match result.status {
                RecipientStatus::Sent => "sent",
                RecipientStatus::Failed => "FAILED",
            };
            println!("  {status:<6} {}", result.customer);
        }
        println!("{} ({} failed)", response.message, response.failed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_campaign_id() {
        assert!(parse_campaign_id("0b7e2f7a-5f55-4a53-8d3b-0d2a1f6c9e11").is_ok());
        assert!(matches!(
            parse_campaign_id("spring"),
            Err(CommandError::InvalidId(_))
        ));
    }
}
