//! Activity event emitted after successful workflow transitions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Fire-and-forget activity record. Delivery failure never fails the
/// transition that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub tenant_id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub occurred_utc: DateTime<Utc>,
    pub details: Option<String>,
}

impl ActivityEvent {
    pub fn new(tenant_id: Uuid, actor_id: Uuid, action: &str, details: Option<String>) -> Self {
        Self {
            tenant_id,
            actor_id,
            action: action.to_string(),
            occurred_utc: Utc::now(),
            details,
        }
    }
}
