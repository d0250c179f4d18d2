// ABOUTME: Stack event operations trait for the control plane.
// ABOUTME: Fetches recent stack activity for the deploy monitor.

use super::shared_types::StackEvent;
use crate::types::StackName;
use async_trait::async_trait;

/// Stack event stream access.
#[async_trait]
pub trait StackEventOps: Send + Sync {
    /// Fetch the most recent events for a stack, newest first.
    ///
    /// One page is enough for the monitor: it polls on an interval and
    /// dedupes by event id, so older history is never needed.
    async fn recent_stack_events(
        &self,
        name: &StackName,
    ) -> Result<Vec<StackEvent>, EventError>;
}

/// Errors from stack event operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("control plane error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}
