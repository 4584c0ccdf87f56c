//! Seed customers and campaigns from a YAML file.
//!
//! ```yaml
//! customers:
//!   - email: ada@example.com
//!     first_name: Ada
//!     company: Analytical Engines
//!     tags: [vip, beta]
//! campaigns:
//!   - name: Spring launch
//!     subject: Something new this spring
//!     content: "<p>Hi {{first_name}}, ...</p>"
//!     target_tags: [vip]
//!     ai_personalized: true
//! ```
//!
//! Customers whose email already exists are skipped. Campaigns are always
//! inserted.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use outreach_dispatch::db::{CampaignRepository, CustomerRepository, RepositoryError};
use outreach_dispatch::models::{NewCampaign, NewCustomer};

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    customers: Vec<NewCustomer>,
    #[serde(default)]
    campaigns: Vec<NewCampaign>,
}

/// Parse and validate seed YAML before touching the database.
fn parse(content: &str) -> Result<SeedFile, CommandError> {
    let seed: SeedFile =
        serde_yaml::from_str(content).map_err(|e| CommandError::Seed(e.to_string()))?;

    for (i, campaign) in seed.campaigns.iter().enumerate() {
        for (field, value) in [
            ("name", &campaign.name),
            ("subject", &campaign.subject),
            ("content", &campaign.content),
        ] {
            if value.trim().is_empty() {
                return Err(CommandError::Seed(format!(
                    "campaigns[{i}]: {field} must not be blank"
                )));
            }
        }
    }

    Ok(seed)
}

/// Insert everything in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or an insert fails for a reason other than a duplicate email.
pub async fn run(file_path: &Path) -> Result<(), CommandError> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.display().to_string(),
            source,
        })?;
    let seed = parse(&content)?;
    info!(
        customers = seed.customers.len(),
        campaigns = seed.campaigns.len(),
        "Parsed seed file"
    );

    let pool = connect().await?;
    let customers = CustomerRepository::new(&pool);
    let campaigns = CampaignRepository::new(&pool);

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for customer in &seed.customers {
        match customers.create(customer).await {
            Ok(_) => inserted += 1,
            Err(RepositoryError::Conflict(_)) => {
                warn!(email = %customer.email, "Customer already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    for campaign in &seed.campaigns {
        let created = campaigns.create(campaign).await?;
        info!(
            campaign_id = %created.id,
            name = %created.name,
            status = %created.status,
            "Campaign created"
        );
    }

    info!("Seeding complete!");
    info!("  Customers inserted: {inserted}");
    info!("  Customers skipped (already exist): {skipped}");
    info!("  Campaigns inserted: {}", seed.campaigns.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::{CampaignStatus, CustomerStatus};

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(
            r#"
customers:
  - email: ada@example.com
    first_name: Ada
    tags: [vip]
  - email: bob@example.com
    status: inactive
campaigns:
  - name: Spring
    subject: Hello
    content: "Hi {{first_name}}"
    target_tags: [vip]
"#,
        )
        .expect("valid seed");

        assert_eq!(seed.customers.len(), 2);
        assert_eq!(seed.customers[0].tags, vec!["vip".to_string()]);
        assert_eq!(seed.customers[1].status, CustomerStatus::Inactive);
        assert_eq!(seed.campaigns[0].initial_status(), CampaignStatus::Draft);
        assert!(!seed.campaigns[0].ai_personalized);
    }

    #[test]
    fn test_parse_rejects_bad_email_and_blank_fields() {
        assert!(parse("customers:\n  - email: not-an-email\n").is_err());

        let err = parse("campaigns:\n  - name: Spring\n    subject: ' '\n    content: Hi\n")
            .expect_err("blank subject");
        assert!(err.to_string().contains("campaigns[0]: subject"));
    }

    #[test]
    fn test_parse_empty_file_sections() {
        let seed = parse("customers: []\n").expect("valid seed");
        assert!(seed.customers.is_empty());
        assert!(seed.campaigns.is_empty());
    }
}
