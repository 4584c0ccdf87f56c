//! Outreach Core - Shared domain types and rules.
//!
//! This crate provides the types used across all Outreach components:
//! - `dispatch` - CRM JSON API and the campaign dispatch function
//! - `cli` - Command-line tools for migrations, seeding and campaign sends
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Audience matching and template personalization live
//! here so the server, the CLI and the tests all agree on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails and status enums
//! - [`audience`] - Tag-overlap audience matching
//! - [`personalize`] - Placeholder substitution for campaign bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audience;
pub mod personalize;
pub mod types;

pub use audience::{AudienceMember, is_in_audience, normalize_tags, resolve_audience};
pub use personalize::{Recipient, personalize};
pub use types::*;
