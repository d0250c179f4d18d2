// ABOUTME: Stack state poller.
// ABOUTME: Polls describe until the stack reaches a terminal status or disappears.

use std::time::Duration;

use crate::provider::{StackDetails, StackOps};
use crate::types::StackName;

use super::error::DeployError;

/// What stack absence means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// The stack should exist; absence is an error.
    Present,
    /// Deletion is in progress; absence means fully deleted.
    Deleted,
}

/// Poll a stack until it reaches a terminal status.
///
/// Returns the terminal details, or `None` when the stack is gone and
/// deletion was expected. Polls are separated by `interval`; there is no
/// overall deadline. Cancellation happens by dropping the future.
///
/// # Errors
///
/// Returns `DeployError::StackMissing` when the stack is absent (or fully
/// deleted) while expected to be present.
pub async fn wait_for_stack<P: StackOps>(
    provider: &P,
    name: &StackName,
    expect: Expect,
    interval: Duration,
) -> Result<Option<StackDetails>, DeployError> {
    loop {
        match provider.describe_stack(name).await? {
            None => {
                return match expect {
                    Expect::Deleted => {
                        tracing::debug!(stack = %name, "stack fully deleted");
                        Ok(None)
                    }
                    Expect::Present => Err(DeployError::StackMissing(name.clone())),
                };
            }
            Some(details) if details.status.is_terminal() => {
                if expect == Expect::Present && details.status.is_delete_complete() {
                    return Err(DeployError::StackMissing(name.clone()));
                }
                return Ok(Some(details));
            }
            Some(details) => {
                tracing::debug!(
                    stack = %name,
                    status = %details.status,
                    "waiting for stack to stabilize"
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
}
