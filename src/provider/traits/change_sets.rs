// ABOUTME: Change set operations trait for the control plane.
// ABOUTME: Create, describe, execute, and delete change sets.

use super::shared_types::{ChangeSetDescription, ChangeSetRequest};
use crate::types::{ChangeSetId, StackName};
use async_trait::async_trait;

/// Change set lifecycle operations.
///
/// A change set is a control-plane-computed preview of the difference
/// between a stack's current and desired template, executable atomically.
#[async_trait]
pub trait ChangeSetOps: Send + Sync {
    /// Submit a change set for computation.
    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<ChangeSetId, ChangeSetError>;

    /// Describe a change set, including its proposed changes once computed.
    async fn describe_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<ChangeSetDescription, ChangeSetError>;

    /// Execute a computed change set, starting an asynchronous stack update.
    async fn execute_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<(), ChangeSetError>;

    /// Delete an unexecuted change set.
    async fn delete_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<(), ChangeSetError>;
}

/// Errors from change set operations.
#[derive(Debug, thiserror::Error)]
pub enum ChangeSetError {
    #[error("change set not found: {0}")]
    NotFound(String),

    #[error("control plane error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}
