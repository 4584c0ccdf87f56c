//! Campaign audience matching.
//!
//! A customer belongs to a campaign's audience when they are active and, if the
//! campaign targets any tags, share at least one of them. An empty target list
//! means every active customer. Tags compare exactly (case-sensitive), the same
//! way the `tags && $1` array-overlap query in the dispatch crate does.

use crate::CustomerStatus;

/// Anything that can be tested for audience membership.
pub trait AudienceMember {
    /// The member's current status.
    fn status(&self) -> CustomerStatus;
    /// The member's free-form tag set.
    fn tags(&self) -> &[String];
}

/// Returns true when a customer with `status` and `tags` is targeted by
/// `target_tags`.
#[must_use]
pub fn is_in_audience(status: CustomerStatus, tags: &[String], target_tags: &[String]) -> bool {
    if !status.is_reachable() {
        return false;
    }
    target_tags.is_empty() || tags.iter().any(|tag| target_tags.contains(tag))
}

/// Filter `customers` down to the audience for `target_tags`, preserving order.
#[must_use]
pub fn resolve_audience<'a, T: AudienceMember>(
    customers: &'a [T],
    target_tags: &[String],
) -> Vec<&'a T> {
    customers
        .iter()
        .filter(|c| is_in_audience(c.status(), c.tags(), target_tags))
        .collect()
}

/// Clean up user-entered tags: trim, drop blanks, drop duplicates (first wins).
///
/// ```
/// use outreach_core::normalize_tags;
///
/// let tags = normalize_tags([" vip", "", "beta ", "vip"]);
/// assert_eq!(tags, vec!["vip".to_string(), "beta".to_string()]);
/// ```
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        status: CustomerStatus,
        tags: Vec<String>,
    }

    impl AudienceMember for Row {
        fn status(&self) -> CustomerStatus {
            self.status
        }

        fn tags(&self) -> &[String] {
            &self.tags
        }
    }

    fn row(name: &'static str, status: CustomerStatus, tags: &[&str]) -> Row {
        Row {
            name,
            status,
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn fixture() -> Vec<Row> {
        vec![
            row("ana", CustomerStatus::Active, &["vip", "retail"]),
            row("ben", CustomerStatus::Active, &["wholesale"]),
            row("cai", CustomerStatus::Inactive, &["vip"]),
            row("dee", CustomerStatus::Active, &[]),
            row("eli", CustomerStatus::Active, &["beta", "vip"]),
        ]
    }

    fn names(rows: &[&Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_overlap_selects_active_customers_sharing_a_tag() {
        let customers = fixture();
        let audience = resolve_audience(&customers, &tags(&["vip"]));
        assert_eq!(names(&audience), vec!["ana", "eli"]);
    }

    #[test]
    fn test_any_single_shared_tag_is_enough() {
        let customers = fixture();
        let audience = resolve_audience(&customers, &tags(&["wholesale", "beta"]));
        assert_eq!(names(&audience), vec!["ben", "eli"]);
    }

    #[test]
    fn test_empty_targets_select_all_active() {
        let customers = fixture();
        let audience = resolve_audience(&customers, &[]);
        assert_eq!(names(&audience), vec!["ana", "ben", "dee", "eli"]);
    }

    #[test]
    fn test_inactive_never_selected() {
        assert!(!is_in_audience(
            CustomerStatus::Inactive,
            &tags(&["vip"]),
            &tags(&["vip"])
        ));
        assert!(!is_in_audience(CustomerStatus::Inactive, &[], &[]));
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!(!is_in_audience(
            CustomerStatus::Active,
            &tags(&["VIP"]),
            &tags(&["vip"])
        ));
    }

    #[test]
    fn test_untagged_customer_needs_empty_targets() {
        assert!(is_in_audience(CustomerStatus::Active, &[], &[]));
        assert!(!is_in_audience(CustomerStatus::Active, &[], &tags(&["vip"])));
    }

    #[test]
    fn test_no_match_is_empty() {
        let customers = fixture();
        assert!(resolve_audience(&customers, &tags(&["nobody"])).is_empty());
    }

    #[test]
    fn test_normalize_tags() {
        assert_eq!(normalize_tags(["a", " b ", "", "a", "  "]), tags(&["a", "b"]));
        assert!(normalize_tags(Vec::<String>::new()).is_empty());
    }
}
