//! Customer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use outreach_core::{AudienceMember, CustomerId, CustomerStatus, Email, Recipient};

/// A customer in the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: CustomerStatus,
    pub tags: Vec<String>,
    /// Free-form JSON object.
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// The fields campaign templates may reference.
    #[must_use]
    pub fn recipient(&self) -> Recipient<'_> {
        Recipient {
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            company: self.company.as_deref(),
            email: self.email.as_str(),
        }
    }

    /// Display name for activity feeds: "First Last", falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.email.as_str(),
        )
    }
}

impl AudienceMember for Customer {
    fn status(&self) -> CustomerStatus {
        self.status
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Join the non-blank name parts, or fall back to `email`.
#[must_use]
pub fn display_name(first: Option<&str>, last: Option<&str>, email: &str) -> String {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        email.to_string()
    } else {
        name
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub email: Email,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub status: CustomerStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Partial update for a customer. Absent fields are left unchanged; an empty
/// string clears an optional text field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerUpdate {
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<CustomerStatus>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<JsonValue>,
}

/// Query filters for listing customers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    pub status: Option<CustomerStatus>,
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name(Some("Ada"), Some("Lovelace"), "ada@x.io"),
            "Ada Lovelace"
        );
        assert_eq!(display_name(Some("Ada"), None, "ada@x.io"), "Ada");
        assert_eq!(display_name(Some(" "), Some(""), "ada@x.io"), "ada@x.io");
        assert_eq!(display_name(None, None, "ada@x.io"), "ada@x.io");
    }

    #[test]
    fn test_new_customer_defaults() {
        let input: NewCustomer =
            serde_json::from_str(r#"{"email": "ada@example.com"}"#).expect("valid json");
        assert_eq!(input.status, CustomerStatus::Active);
        assert!(input.tags.is_empty());
        assert!(input.metadata.is_none());
    }

    #[test]
    fn test_new_customer_rejects_bad_email() {
        assert!(serde_json::from_str::<NewCustomer>(r#"{"email": "nope"}"#).is_err());
    }
}
