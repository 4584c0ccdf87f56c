//! Customer email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Longest address accepted (RFC 5321).
const MAX_EMAIL_LEN: usize = 254;

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most 254 characters")]
    TooLong,
    #[error("email cannot contain whitespace")]
    Whitespace,
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    #[error("email is missing the part before @")]
    MissingMailbox,
    #[error("email domain must look like example.com")]
    InvalidDomain,
}

/// A customer email address, trimmed and structurally checked.
///
/// Deliverability is left to the email provider. Addresses are compared
/// exactly as stored; the database's unique constraint decides duplicates.
///
/// ```
/// use outreach_core::Email;
///
/// let email = Email::parse("  jane@example.com ").unwrap();
/// assert_eq!(email.as_str(), "jane@example.com");
/// assert!(Email::parse("jane@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let candidate = raw.trim();
        check(candidate)?;
        Ok(Self(candidate.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn check(candidate: &str) -> Result<(), EmailError> {
    match candidate.len() {
        0 => return Err(EmailError::Empty),
        n if n > MAX_EMAIL_LEN => return Err(EmailError::TooLong),
        _ => {}
    }
    if candidate.contains(char::is_whitespace) {
        return Err(EmailError::Whitespace);
    }

    let mut parts = candidate.split('@');
    let (Some(mailbox), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(EmailError::AtSymbol);
    };
    if mailbox.is_empty() {
        return Err(EmailError::MissingMailbox);
    }
    let dotted: Vec<&str> = domain.split('.').collect();
    if dotted.len() < 2 || dotted.iter().any(|label| label.is_empty()) {
        return Err(EmailError::InvalidDomain);
    }
    Ok(())
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_addresses() {
        for raw in ["user@example.com", "first.last+promo@example.co.uk", "a@b.c"] {
            assert_eq!(Email::parse(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let email = Email::parse("\tuser@example.com  ").unwrap();
        assert_eq!(email.to_string(), "user@example.com");
    }

    #[test]
    fn test_rejections() {
        let cases = [
            ("   ", EmailError::Empty),
            ("no-at-symbol", EmailError::AtSymbol),
            ("a@b@c.com", EmailError::AtSymbol),
            ("@example.com", EmailError::MissingMailbox),
            ("user@", EmailError::InvalidDomain),
            ("user@localhost", EmailError::InvalidDomain),
            ("user@.example.com", EmailError::InvalidDomain),
            ("user@example..com", EmailError::InvalidDomain),
            ("us er@example.com", EmailError::Whitespace),
        ];
        for (raw, expected) in cases {
            assert_eq!(Email::parse(raw), Err(expected), "{raw:?}");
        }

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
    }

    #[test]
    fn test_deserialize_validates() {
        let parsed: Email = serde_json::from_str("\" user@example.com\"").unwrap();
        assert_eq!(parsed.as_str(), "user@example.com");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
