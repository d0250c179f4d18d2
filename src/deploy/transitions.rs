// ABOUTME: State transition methods for stack deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::time::Duration;

use crate::provider::{
    Capability, ChangeSetDescription, ChangeSetOps, ChangeSetRequest, ChangeSetType, StackDetails,
    StackOps,
};
use crate::storage::{AssetStore, UploadOptions};
use crate::template::{self, MAX_INLINE_TEMPLATE_BYTES, TemplateBody};
use crate::types::StackName;

use super::StackDeployment;
use super::descriptor::DeployResult;
use super::error::DeployError;
use super::poll::{Expect, wait_for_stack};
use super::state::{ChangeSetReady, Executed, Initialized, TemplateResolved};

/// Outcome of change set creation.
#[derive(Debug)]
pub enum ChangeSetOutcome {
    /// The change set proposes changes and is ready to execute.
    Ready(StackDeployment<ChangeSetReady>),
    /// The template produced no difference; the change set has been deleted
    /// and the current stack outputs returned.
    NoChanges(DeployResult),
}

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> StackDeployment<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self) -> StackDeployment<T> {
        StackDeployment {
            descriptor: self.descriptor,
            deploy_name: self.deploy_name,
            execution_id: self.execution_id,
            role_arn: self.role_arn,
            body: self.body,
            change_set_name: self.change_set_name,
            change_set_type: self.change_set_type,
            change_count: self.change_count,
            _state: std::marker::PhantomData,
        }
    }

    /// Change set name for this attempt, unique per execution id.
    fn fresh_change_set_name(&self) -> String {
        format!("stiva-deploy-{}", self.execution_id)
    }
}

/// The control plane reports an empty diff as a failed change set rather
/// than an empty one.
fn is_no_change_failure(reason: &str) -> bool {
    reason.contains("didn't contain changes") || reason.contains("No updates are to be performed")
}

async fn wait_for_change_set<P: ChangeSetOps>(
    provider: &P,
    stack_name: &StackName,
    change_set_name: &str,
    interval: Duration,
) -> Result<ChangeSetDescription, DeployError> {
    loop {
        let description = provider
            .describe_change_set(stack_name, change_set_name)
            .await?;

        if description.status.is_terminal() {
            return Ok(description);
        }

        tracing::debug!(
            stack = %stack_name,
            change_set = %change_set_name,
            status = %description.status,
            "waiting for change set"
        );
        tokio::time::sleep(interval).await;
    }
}

// =============================================================================
// Initialized -> TemplateResolved
// =============================================================================

impl StackDeployment<Initialized> {
    /// Resolve how the template reaches the control plane.
    ///
    /// With toolkit storage configured the template is always uploaded and
    /// referenced by URL, regardless of size. Without it, templates over the
    /// inline maximum fail here, before any control plane call.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::TemplateTooLarge` if the serialized template
    /// exceeds the inline maximum and no store is available.
    #[must_use = "deployment state must be used"]
    pub async fn resolve_template<A: AssetStore>(
        self,
        store: Option<&A>,
    ) -> Result<StackDeployment<TemplateResolved>, DeployError> {
        let serialized = template::to_yaml(&self.descriptor.template)?;

        let body = match store {
            Some(store) => {
                let options = UploadOptions {
                    key_prefix: format!("templates/{}/", self.deploy_name),
                    key_suffix: ".yml".to_string(),
                    content_type: "application/x-yaml".to_string(),
                };
                let upload = store
                    .upload_if_changed(serialized.as_bytes(), &options)
                    .await?;
                TemplateBody::Url(store.object_url(&upload.key))
            }
            None if serialized.len() > MAX_INLINE_TEMPLATE_BYTES => {
                return Err(DeployError::TemplateTooLarge {
                    name: self.deploy_name.clone(),
                    size: serialized.len(),
                    limit: MAX_INLINE_TEMPLATE_BYTES,
                });
            }
            None => TemplateBody::Inline(serialized),
        };

        let mut next: StackDeployment<TemplateResolved> = self.transition();
        next.body = Some(body);
        Ok(next)
    }
}

// =============================================================================
// TemplateResolved -> ChangeSetReady (or no-op)
// =============================================================================

impl StackDeployment<TemplateResolved> {
    /// Create a change set and wait until the control plane has computed it.
    ///
    /// A stack left over from a failed creation is deleted first; the deploy
    /// aborts if that deletion does not reach the fully deleted state. The
    /// change set type is CREATE when the stack does not exist and UPDATE
    /// otherwise. An empty change list is a no-op: the change set is deleted
    /// and the current outputs returned.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::CleanupFailed` if a previously failed stack
    /// cannot be deleted, `DeployError::ChangeSetFailed` if the control
    /// plane rejects the change set.
    #[must_use = "deployment state must be used"]
    pub async fn create_change_set<P: StackOps + ChangeSetOps>(
        self,
        provider: &P,
        poll_interval: Duration,
    ) -> Result<ChangeSetOutcome, DeployError> {
        let existing = match provider.describe_stack(&self.deploy_name).await? {
            Some(details) if details.status.is_failed_creation() => {
                tracing::warn!(
                    stack = %self.deploy_name,
                    status = %details.status,
                    "stack previously failed creation, deleting it before redeploying"
                );
                provider
                    .delete_stack(&self.deploy_name, self.role_arn.as_deref())
                    .await?;
                let deleted =
                    wait_for_stack(provider, &self.deploy_name, Expect::Deleted, poll_interval)
                        .await?;
                if let Some(details) = deleted
                    && !details.status.is_delete_complete()
                {
                    return Err(DeployError::CleanupFailed {
                        name: self.deploy_name.clone(),
                        status: details.status,
                    });
                }
                None
            }
            other => other,
        };

        let change_set_type = if existing.is_some() {
            ChangeSetType::Update
        } else {
            ChangeSetType::Create
        };
        let change_set_name = self.fresh_change_set_name();

        let request = ChangeSetRequest {
            stack_name: self.deploy_name.clone(),
            change_set_name: change_set_name.clone(),
            change_set_type,
            template: self
                .body
                .clone()
                .expect("resolved deployment must have a template body"),
            parameters: self.descriptor.parameters.clone(),
            role_arn: self.role_arn.clone(),
            capabilities: vec![Capability::Iam, Capability::NamedIam],
        };

        tracing::debug!(
            stack = %self.deploy_name,
            change_set = %change_set_name,
            change_set_type = %change_set_type,
            "creating change set"
        );
        provider.create_change_set(&request).await?;

        let description =
            wait_for_change_set(provider, &self.deploy_name, &change_set_name, poll_interval)
                .await?;

        if description.status.is_failed() {
            let reason = description
                .status_reason
                .clone()
                .unwrap_or_else(|| "no reason reported".to_string());

            if !is_no_change_failure(&reason) {
                return Err(DeployError::ChangeSetFailed {
                    name: self.deploy_name.clone(),
                    change_set_name,
                    reason,
                });
            }
        }

        if description.status.is_failed() || description.changes.is_empty() {
            tracing::debug!(
                stack = %self.deploy_name,
                change_set = %change_set_name,
                "change set contains no changes, deleting it"
            );
            provider
                .delete_change_set(&self.deploy_name, &change_set_name)
                .await?;
            return Ok(ChangeSetOutcome::NoChanges(no_op_result(
                existing,
                &description,
            )));
        }

        let change_count = description.changes.len();
        let mut next: StackDeployment<ChangeSetReady> = self.transition();
        next.change_set_name = Some(change_set_name);
        next.change_set_type = Some(change_set_type);
        next.change_count = Some(change_count);
        Ok(ChangeSetOutcome::Ready(next))
    }
}

fn no_op_result(existing: Option<StackDetails>, description: &ChangeSetDescription) -> DeployResult {
    DeployResult {
        no_op: true,
        outputs: existing.map(|details| details.outputs).unwrap_or_default(),
        stack_id: description.stack_id.clone(),
    }
}

// =============================================================================
// ChangeSetReady -> Executed
// =============================================================================

impl StackDeployment<ChangeSetReady> {
    /// Execute the change set, starting an asynchronous stack update.
    ///
    /// # Errors
    ///
    /// Returns error if the control plane rejects the execution.
    #[must_use = "deployment state must be used"]
    pub async fn execute<P: ChangeSetOps>(
        self,
        provider: &P,
    ) -> Result<StackDeployment<Executed>, DeployError> {
        let change_set_name = self.change_set_name().to_string();
        tracing::debug!(
            stack = %self.deploy_name,
            change_set = %change_set_name,
            "executing change set"
        );
        provider
            .execute_change_set(&self.deploy_name, &change_set_name)
            .await?;
        Ok(self.transition())
    }
}

// =============================================================================
// Executed - Terminal Transition
// =============================================================================

impl StackDeployment<Executed> {
    /// Wait for the stack to reach a terminal status and collect the result.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::UnexpectedStatus` if the stack stabilizes in
    /// anything other than a successful create or update.
    pub async fn wait_for_completion<P: StackOps>(
        self,
        provider: &P,
        poll_interval: Duration,
    ) -> Result<DeployResult, DeployError> {
        let details =
            wait_for_stack(provider, &self.deploy_name, Expect::Present, poll_interval)
                .await?
                .expect("present expectation yields details or errors");

        if !details.status.is_deploy_success() {
            return Err(DeployError::UnexpectedStatus {
                name: self.deploy_name.clone(),
                status: details.status,
                reason: details
                    .status_reason
                    .unwrap_or_else(|| "no reason reported".to_string()),
            });
        }

        Ok(DeployResult {
            no_op: false,
            outputs: details.outputs,
            stack_id: details.stack_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_failure_reasons_are_recognized() {
        assert!(is_no_change_failure(
            "The submitted information didn't contain changes. Submit different information to create a change set."
        ));
        assert!(is_no_change_failure("No updates are to be performed."));
        assert!(!is_no_change_failure("Access denied"));
    }
}
