// ABOUTME: Stack operations trait for the control plane.
// ABOUTME: Describe and delete named stacks.

use super::shared_types::StackDetails;
use crate::types::StackName;
use async_trait::async_trait;

/// Stack-level operations.
#[async_trait]
pub trait StackOps: Send + Sync {
    /// Describe a stack by name.
    ///
    /// Returns `None` when the stack does not exist. A stack whose latest
    /// status is DELETE_COMPLETE is reported as existing: callers decide what
    /// absence means for the operation in progress.
    async fn describe_stack(&self, name: &StackName) -> Result<Option<StackDetails>, StackError>;

    /// Request deletion of a stack. Returns as soon as the control plane
    /// accepts the request; deletion itself is asynchronous.
    async fn delete_stack(
        &self,
        name: &StackName,
        role_arn: Option<&str>,
    ) -> Result<(), StackError>;
}

/// Errors from stack operations.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("control plane error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}
