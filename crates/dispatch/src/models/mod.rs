//! Domain models for the CRM.
//!
//! - [`customer`] - Customer records and their create/update inputs
//! - [`campaign`] - Email campaigns and their create/update inputs
//! - [`interaction`] - Append-only customer interaction log rows
//! - [`dashboard`] - Aggregated statistics for the dashboard endpoint

pub mod campaign;
pub mod customer;
pub mod dashboard;
pub mod interaction;

pub use campaign::{CampaignUpdate, EmailCampaign, NewCampaign};
pub use customer::{Customer, CustomerFilter, CustomerUpdate, NewCustomer};
pub use dashboard::{ActivityEntry, DashboardStats, TagCount};
pub use interaction::{CustomerInteraction, NewInteraction};
