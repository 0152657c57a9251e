//! Fire-and-forget activity sink.

use std::sync::Arc;

use crate::models::ActivityEvent;
use crate::services::SubmissionStore;

/// Records activity events after successful transitions. Delivery runs
/// detached from the request; a failed write is logged and never fails the
/// transition that produced the event.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn SubmissionStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self { store }
    }

    pub fn record(&self, event: ActivityEvent) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record_activity(&event).await {
                tracing::warn!(
                    error = %e,
                    action = %event.action,
                    tenant_id = %event.tenant_id,
                    "Failed to record activity event"
                );
            }
        });
    }
}
