//! Customer interaction log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use outreach_core::{CustomerId, InteractionId};

/// An append-only audit row for a customer-facing action. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInteraction {
    pub id: InteractionId,
    pub customer_id: CustomerId,
    pub interaction_type: String,
    pub description: String,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// A row to append to the interaction log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInteraction {
    pub customer_id: CustomerId,
    pub interaction_type: String,
    pub description: String,
    pub metadata: JsonValue,
}
