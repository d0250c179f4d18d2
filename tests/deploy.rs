// ABOUTME: Tests for the deploy orchestrator.
// ABOUTME: Covers change set type selection, no-op handling, and failure paths.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use stiva::deploy::{DeployError, DeployOptions, deploy_stack};
use stiva::provider::StackStatus;
use support::{
    MemoryAssetStore, MockCloudFormation, MockFactory, descriptor, empty_change_set,
    failed_change_set, ready_change_set, stack_details,
};

fn options() -> DeployOptions {
    DeployOptions {
        poll_interval: Duration::from_millis(1),
        ..DeployOptions::default()
    }
}

fn quiet_options() -> DeployOptions {
    DeployOptions {
        quiet: true,
        ..options()
    }
}

#[tokio::test]
async fn new_stack_gets_create_change_set() {
    support::init_tracing();
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(None);
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    let result = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    assert!(!result.no_op);
    assert_eq!(result.outputs.get("BucketName").unwrap(), "demo-bucket");
    assert!(result.stack_id.as_str().contains("stack/demo"));

    let calls = provider.calls();
    assert!(calls.contains(&"create_change_set:demo:CREATE".to_string()));
    assert!(calls.contains(&"execute_change_set:demo".to_string()));
}

#[tokio::test]
async fn existing_stack_gets_update_change_set() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_stack(Some(stack_details("demo", StackStatus::UpdateComplete)));
    provider.queue_change_set(ready_change_set(2));
    let factory = MockFactory::new(Arc::clone(&provider));

    deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    assert!(
        provider
            .calls()
            .contains(&"create_change_set:demo:UPDATE".to_string())
    );
}

#[tokio::test]
async fn empty_change_set_is_a_no_op_and_gets_deleted() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(empty_change_set());
    let factory = MockFactory::new(Arc::clone(&provider));

    let result = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    assert!(result.no_op);
    // Current outputs are returned even though nothing was deployed.
    assert_eq!(result.outputs.get("BucketName").unwrap(), "demo-bucket");

    let calls = provider.calls();
    assert!(calls.contains(&"delete_change_set:demo".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("execute_change_set")));
}

#[tokio::test]
async fn no_change_failure_reason_is_a_no_op() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(failed_change_set(
        "The submitted information didn't contain changes. Submit different information to create a change set.",
    ));
    let factory = MockFactory::new(Arc::clone(&provider));

    let result = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    assert!(result.no_op);
    assert!(
        provider
            .calls()
            .contains(&"delete_change_set:demo".to_string())
    );
}

#[tokio::test]
async fn failed_change_set_surfaces_the_reason() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(failed_change_set("Access denied"));
    let factory = MockFactory::new(Arc::clone(&provider));

    let err = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap_err();

    match err {
        DeployError::ChangeSetFailed { name, reason, .. } => {
            assert_eq!(name.as_str(), "demo");
            assert_eq!(reason, "Access denied");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn oversized_template_fails_before_any_remote_call() {
    let provider = Arc::new(MockCloudFormation::new());
    let factory = MockFactory::new(Arc::clone(&provider));

    let mut descriptor = descriptor("demo");
    descriptor.template = json!({ "Description": "x".repeat(60_000) });

    let err = deploy_stack(
        descriptor,
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeployError::TemplateTooLarge { .. }));
    assert!(err.to_string().contains("provision toolkit storage"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn toolkit_storage_always_uploads_and_uses_url_body() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(None);
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));
    let store = MemoryAssetStore::new();

    // Small template: the URL form must be used anyway.
    deploy_stack(descriptor("demo"), &factory, Some(&store), &quiet_options())
        .await
        .unwrap();

    let requests = provider.change_set_requests();
    assert!(requests[0].template.is_url());
    assert_eq!(store.keys().len(), 1);

    // Re-deploying identical content hits the same key without re-uploading.
    deploy_stack(descriptor("demo"), &factory, Some(&store), &quiet_options())
        .await
        .unwrap();

    let requests = provider.change_set_requests();
    assert_eq!(requests[0].template, requests[1].template);
    assert_eq!(store.upload_count(), 1);
}

#[tokio::test]
async fn previously_failed_creation_is_deleted_before_redeploying() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::RollbackComplete)));
    provider.queue_stack(None);
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    let calls = provider.calls();
    let delete = calls
        .iter()
        .position(|c| c == "delete_stack:demo")
        .expect("stale stack should be deleted");
    let create = calls
        .iter()
        .position(|c| c == "create_change_set:demo:CREATE")
        .expect("change set should be CREATE after cleanup");
    assert!(delete < create);
}

#[tokio::test]
async fn stuck_cleanup_aborts_the_deploy() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::RollbackComplete)));
    provider.queue_stack(Some(stack_details("demo", StackStatus::DeleteFailed)));
    let factory = MockFactory::new(Arc::clone(&provider));

    let err = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap_err();

    match err {
        DeployError::CleanupFailed { name, status } => {
            assert_eq!(name.as_str(), "demo");
            assert_eq!(status, StackStatus::DeleteFailed);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(
        !provider
            .calls()
            .iter()
            .any(|c| c.starts_with("create_change_set"))
    );
}

#[tokio::test]
async fn rollback_after_execute_is_an_error() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_stack(Some(stack_details(
        "demo",
        StackStatus::UpdateRollbackComplete,
    )));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    let err = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeployError::UnexpectedStatus { .. }));
}

#[tokio::test]
async fn missing_environment_fails_fast() {
    let provider = Arc::new(MockCloudFormation::new());
    let factory = MockFactory::new(Arc::clone(&provider));

    let mut descriptor = descriptor("demo");
    descriptor.environment = None;

    let err = deploy_stack(
        descriptor,
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeployError::MissingEnvironment(_)));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn change_set_names_are_unique_per_attempt() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_stack(Some(stack_details("demo", StackStatus::UpdateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();
    deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    let requests = provider.change_set_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].change_set_name.starts_with("stiva-deploy-"));
    assert_ne!(requests[0].change_set_name, requests[1].change_set_name);
}

#[tokio::test]
async fn capabilities_are_always_requested() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_stack(Some(stack_details("demo", StackStatus::UpdateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    let request = &provider.change_set_requests()[0];
    let capabilities: Vec<String> =
        request.capabilities.iter().map(|c| c.to_string()).collect();
    assert!(capabilities.contains(&"CAPABILITY_IAM".to_string()));
    assert!(capabilities.contains(&"CAPABILITY_NAMED_IAM".to_string()));
}

#[tokio::test]
async fn noisy_deploy_fetches_stack_events() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(None);
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &options(),
    )
    .await
    .unwrap();

    // The monitor's final sweep guarantees at least one event fetch.
    assert!(
        provider
            .calls()
            .iter()
            .any(|c| c.starts_with("recent_stack_events"))
    );
}

#[tokio::test]
async fn quiet_deploy_never_fetches_stack_events() {
    let provider = Arc::new(MockCloudFormation::new());
    provider.queue_stack(None);
    provider.queue_stack(Some(stack_details("demo", StackStatus::CreateComplete)));
    provider.queue_change_set(ready_change_set(1));
    let factory = MockFactory::new(Arc::clone(&provider));

    let result = deploy_stack(
        descriptor("demo"),
        &factory,
        None::<&MemoryAssetStore>,
        &quiet_options(),
    )
    .await
    .unwrap();

    // Quiet mode only changes observability, never the result.
    assert!(!result.no_op);
    assert!(
        !provider
            .calls()
            .iter()
            .any(|c| c.starts_with("recent_stack_events"))
    );
}

/// Verifies the type signatures of the deployment state machine compile.
#[test]
fn transition_type_signatures_compile() {
    use stiva::deploy::{
        ChangeSetOutcome, ChangeSetReady, DeployResult, Executed, Initialized, StackDeployment,
        TemplateResolved,
    };
    use stiva::provider::{ChangeSetOps, StackOps};
    use stiva::storage::AssetStore;

    // Never called; exists so a wrong signature fails the build.
    #[allow(dead_code)]
    async fn check_signatures<P: StackOps + ChangeSetOps, A: AssetStore>(
        provider: &P,
        store: Option<&A>,
        deployment: StackDeployment<Initialized>,
    ) -> Result<DeployResult, stiva::deploy::DeployError> {
        let resolved: StackDeployment<TemplateResolved> =
            deployment.resolve_template(store).await?;
        let outcome: ChangeSetOutcome = resolved
            .create_change_set(provider, Duration::from_secs(5))
            .await?;
        let ready: StackDeployment<ChangeSetReady> = match outcome {
            ChangeSetOutcome::Ready(ready) => ready,
            ChangeSetOutcome::NoChanges(result) => return Ok(result),
        };
        let executed: StackDeployment<Executed> = ready.execute(provider).await?;
        executed
            .wait_for_completion(provider, Duration::from_secs(5))
            .await
    }
}
