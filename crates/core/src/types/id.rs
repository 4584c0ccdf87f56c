//! Typed record IDs.
//!
//! Customers, campaigns and interactions are all keyed by UUIDs; separate
//! types keep a campaign ID from being passed where a customer ID belongs.

/// Declare a UUID-backed ID newtype.
///
/// The generated type is `Copy`, serializes as the bare UUID string, parses
/// with `FromStr` (surrounding whitespace ignored), and with the `postgres`
/// feature binds and decodes as a Postgres `uuid`.
///
/// ```rust
/// # use outreach_core::define_id;
/// define_id!(ListId);
///
/// let id = ListId::generate();
/// assert_eq!(id.to_string().parse::<ListId>().unwrap(), id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// A fresh random (v4) ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id!(CustomerId);
define_id!(CampaignId);
define_id!(InteractionId);
define_id!(UserId);
