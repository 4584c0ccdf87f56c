//! Placeholder substitution for campaign bodies.
//!
//! Four tokens are recognised:
//!
//! | token            | value                | fallback         |
//! |------------------|----------------------|------------------|
//! | `{{first_name}}` | customer first name  | `there`          |
//! | `{{last_name}}`  | customer last name   | (empty)          |
//! | `{{company}}`    | customer company     | `your company`   |
//! | `{{email}}`      | customer email       | -                |
//!
//! An empty field counts as missing; anything else is inserted exactly as
//! stored, whitespace included. Any other `{{...}}` sequence is left
//! untouched. Substitution is a single left-to-right pass, so customer data that
//! happens to contain a token is never expanded a second time.

/// Fallback used when a recipient has no first name.
pub const FIRST_NAME_FALLBACK: &str = "there";
/// Fallback used when a recipient has no company.
pub const COMPANY_FALLBACK: &str = "your company";

/// The customer fields a template may reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recipient<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub company: Option<&'a str>,
    pub email: &'a str,
}

impl<'a> Recipient<'a> {
    fn value_for(&self, token: &str) -> Option<&str> {
        let present = |field: Option<&'a str>| -> Option<&'a str> { field.filter(|v| !v.is_empty()) };
        match token {
            "first_name" => Some(present(self.first_name).unwrap_or(FIRST_NAME_FALLBACK)),
            "last_name" => Some(present(self.last_name).unwrap_or("")),
            "company" => Some(present(self.company).unwrap_or(COMPANY_FALLBACK)),
            "email" => Some(self.email),
            _ => None,
        }
    }
}

/// Replace every recognised placeholder in `template` with `recipient` data.
///
/// ```
/// use outreach_core::{Recipient, personalize};
///
/// let recipient = Recipient {
///     first_name: Some("Ada"),
///     email: "ada@example.com",
///     ..Recipient::default()
/// };
/// assert_eq!(
///     personalize("Hi {{first_name}} from {{company}}", &recipient),
///     "Hi Ada from your company"
/// );
/// ```
#[must_use]
pub fn personalize(template: &str, recipient: &Recipient<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        let substituted = tail
            .get(2..)
            .and_then(|inner| inner.find("}}").map(|end| (inner, end)))
            .and_then(|(inner, end)| {
                let token = inner.get(..end)?;
                let value = recipient.value_for(token)?;
                Some((value, inner.get(end + 2..)?))
            });

        if let Some((value, after)) = substituted {
            out.push_str(value);
            rest = after;
        } else {
            out.push_str("{{");
            rest = tail.get(2..).unwrap_or("");
        }
    }

    out.push_str(rest);
    out
}
