// ABOUTME: End-to-end deploy and destroy operations.
// ABOUTME: Composes template resolution, change sets, polling, and monitoring.

use std::sync::Arc;

use crate::progress::{OutputMode, Reporter};
use crate::provider::{Mode, ProviderFactory, StackOps};
use crate::storage::AssetStore;
use crate::types::StackName;

use super::deployment::StackDeployment;
use super::descriptor::{DeployOptions, DeployResult, StackDescriptor};
use super::error::DeployError;
use super::monitor::StackActivityMonitor;
use super::poll::{Expect, wait_for_stack};
use super::transitions::ChangeSetOutcome;

/// Deploy a stack: create it if absent, update it otherwise.
///
/// Repeated deploys of an unchanged template are no-ops with no side
/// effects beyond change set creation and deletion. With toolkit storage
/// the template is always uploaded; without it, templates over the inline
/// maximum fail before any control plane call.
///
/// # Errors
///
/// Returns `DeployError::MissingEnvironment` when the descriptor has no
/// resolved environment; remote errors propagate unretried.
pub async fn deploy_stack<F, A>(
    descriptor: StackDescriptor,
    factory: &F,
    toolkit: Option<&A>,
    options: &DeployOptions,
) -> Result<DeployResult, DeployError>
where
    F: ProviderFactory,
    A: AssetStore,
{
    let environment = descriptor
        .environment
        .clone()
        .ok_or_else(|| DeployError::MissingEnvironment(descriptor.name.clone()))?;
    let deploy_name = resolve_deploy_name(&descriptor, options);
    let metadata = descriptor.metadata.clone();
    let reporter = reporter(options);

    let provider = factory
        .cloud_formation(&environment, Mode::ForWriting)
        .await?;

    let deployment =
        StackDeployment::new(descriptor, deploy_name.clone(), options.role_arn.clone());
    tracing::debug!(
        stack = %deploy_name,
        environment = %environment,
        execution = %deployment.execution_id(),
        "deploying stack"
    );
    reporter.progress(&format!("Deploying stack {deploy_name} to {environment}"));

    let deployment = deployment.resolve_template(toolkit).await?;
    let deployment = match deployment
        .create_change_set(provider.as_ref(), options.poll_interval)
        .await?
    {
        ChangeSetOutcome::NoChanges(result) => {
            reporter.success(&format!("Stack {deploy_name} is up to date (no changes)"));
            return Ok(result);
        }
        ChangeSetOutcome::Ready(deployment) => deployment,
    };

    // Monitor starts strictly before execution so no event goes unseen,
    // and stops on every exit path.
    let monitor = (!options.quiet).then(|| {
        let monitor = StackActivityMonitor::new(
            Arc::clone(&provider),
            deploy_name.clone(),
            Arc::clone(&reporter),
            Some(deployment.change_count()),
            metadata,
            options.poll_interval,
        );
        monitor.start();
        monitor
    });

    let deployment = match deployment.execute(provider.as_ref()).await {
        Ok(deployment) => deployment,
        Err(e) => {
            stop_monitor(&monitor).await;
            return Err(e);
        }
    };

    let result = deployment
        .wait_for_completion(provider.as_ref(), options.poll_interval)
        .await;
    stop_monitor(&monitor).await;

    let result = result?;
    tracing::debug!(stack = %deploy_name, stack_id = %result.stack_id, "stack deployed");
    reporter.success(&format!("Stack {deploy_name} deployed"));
    Ok(result)
}

/// Destroy a stack and verify it is fully deleted.
///
/// Destroying a stack that does not exist succeeds without issuing a
/// delete request.
///
/// # Errors
///
/// Returns `DeployError::DestroyFailed` naming the deploy name and the
/// observed status when deletion stabilizes anywhere short of fully
/// deleted.
pub async fn destroy_stack<F>(
    descriptor: &StackDescriptor,
    factory: &F,
    options: &DeployOptions,
) -> Result<(), DeployError>
where
    F: ProviderFactory,
{
    let environment = descriptor
        .environment
        .clone()
        .ok_or_else(|| DeployError::MissingEnvironment(descriptor.name.clone()))?;
    let deploy_name = resolve_deploy_name(descriptor, options);
    let reporter = reporter(options);

    let provider = factory
        .cloud_formation(&environment, Mode::ForWriting)
        .await?;

    if provider.describe_stack(&deploy_name).await?.is_none() {
        tracing::debug!(stack = %deploy_name, "stack does not exist, nothing to destroy");
        return Ok(());
    }

    tracing::debug!(stack = %deploy_name, environment = %environment, "destroying stack");
    reporter.progress(&format!("Destroying stack {deploy_name}"));

    // Total change count is unknown for a destroy.
    let monitor = (!options.quiet).then(|| {
        let monitor = StackActivityMonitor::new(
            Arc::clone(&provider),
            deploy_name.clone(),
            Arc::clone(&reporter),
            None,
            descriptor.metadata.clone(),
            options.poll_interval,
        );
        monitor.start();
        monitor
    });

    if let Err(e) = provider
        .delete_stack(&deploy_name, options.role_arn.as_deref())
        .await
    {
        stop_monitor(&monitor).await;
        return Err(e.into());
    }

    let waited = wait_for_stack(
        provider.as_ref(),
        &deploy_name,
        Expect::Deleted,
        options.poll_interval,
    )
    .await;
    stop_monitor(&monitor).await;

    if let Some(details) = waited?
        && !details.status.is_delete_complete()
    {
        return Err(DeployError::DestroyFailed {
            name: deploy_name,
            status: details.status,
        });
    }

    tracing::debug!(stack = %deploy_name, "stack destroyed");
    reporter.success(&format!("Stack {deploy_name} destroyed"));
    Ok(())
}

fn resolve_deploy_name(descriptor: &StackDescriptor, options: &DeployOptions) -> StackName {
    options
        .deploy_name
        .clone()
        .unwrap_or_else(|| descriptor.name.clone())
}

fn reporter(options: &DeployOptions) -> Arc<Reporter> {
    let mode = if options.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    Arc::new(Reporter::new(mode))
}

async fn stop_monitor<P>(monitor: &Option<StackActivityMonitor<P>>)
where
    P: crate::provider::StackEventOps + Send + Sync + 'static,
{
    if let Some(monitor) = monitor {
        monitor.stop().await;
    }
}
