// ABOUTME: Error types for deploy and destroy operations.
// ABOUTME: Covers configuration, template size, change set, and terminal state failures.

use crate::provider::{ChangeSetError, FactoryError, StackError, StackStatus};
use crate::storage::StorageError;
use crate::template::TemplateError;
use crate::types::StackName;

/// Errors that can occur while deploying or destroying a stack.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The descriptor has no resolved environment. No remote call was made.
    #[error(
        "stack {0} does not have a resolved environment; set account and region before deploying"
    )]
    MissingEnvironment(StackName),

    /// The serialized template is too large to pass inline and no toolkit
    /// storage is configured. No remote call was made.
    #[error(
        "template for stack {name} is {size} bytes, larger than the {limit}-byte inline maximum; \
         provision toolkit storage and pass it to the deploy so the template can be uploaded"
    )]
    TemplateTooLarge {
        name: StackName,
        size: usize,
        limit: usize,
    },

    /// A stack left over from a failed creation could not be fully deleted.
    #[error(
        "failed to clean up stack {name} that previously failed creation (current status: {status})"
    )]
    CleanupFailed { name: StackName, status: StackStatus },

    /// The control plane reported the change set as failed.
    #[error("change set {change_set_name} for stack {name} failed: {reason}")]
    ChangeSetFailed {
        name: StackName,
        change_set_name: String,
        reason: String,
    },

    /// The stack disappeared while an operation expected it to exist.
    #[error("stack {0} no longer exists")]
    StackMissing(StackName),

    /// The stack reached a terminal status other than the expected success.
    #[error("stack {name} finished in unexpected status {status}: {reason}")]
    UnexpectedStatus {
        name: StackName,
        status: StackStatus,
        reason: String,
    },

    /// Deletion finished but the stack is not fully deleted.
    #[error("failed to destroy stack {name}: final status {status}")]
    DestroyFailed { name: StackName, status: StackStatus },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error("stack operation failed: {0}")]
    Stack(#[from] StackError),

    #[error("change set operation failed: {0}")]
    ChangeSet(#[from] ChangeSetError),

    #[error("template upload failed: {0}")]
    Storage(#[from] StorageError),
}
