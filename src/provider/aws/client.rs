// ABOUTME: AwsCloudFormation client and factory implementation.
// ABOUTME: Maps the AWS SDK surface onto the provider capability traits.

use crate::provider::traits::{
    Capability, ChangeSetDescription, ChangeSetError, ChangeSetOps, ChangeSetRequest,
    ChangeSetStatus, ChangeSetType, EventError, FactoryError, Mode, Parameter, ProviderFactory,
    ResourceChange, StackDetails, StackError, StackEvent, StackEventOps, StackOps, StackStatus,
};
use crate::template::TemplateBody;
use crate::types::{ChangeSetId, Environment, StackId, StackName};
use async_trait::async_trait;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::primitives::DateTime as SdkDateTime;
use aws_sdk_cloudformation::types as sdk;
use chrono::{DateTime, Utc};
use std::sync::Arc;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn error_parts<E>(err: &SdkError<E, impl std::fmt::Debug>) -> Option<(String, String)>
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::ServiceError(ctx) => {
            let e = ctx.err();
            let code = e.code().unwrap_or("Unknown").to_string();
            let message = e.message().unwrap_or("no message").to_string();
            Some((code, message))
        }
        _ => None,
    }
}

fn map_stack_error<E>(err: SdkError<E, impl std::fmt::Debug>) -> StackError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error_parts(&err) {
        Some((code, message)) => StackError::Api { code, message },
        None => StackError::Transport(err.to_string()),
    }
}

fn map_change_set_error<E>(err: SdkError<E, impl std::fmt::Debug>) -> ChangeSetError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error_parts(&err) {
        Some((code, message)) if code == "ChangeSetNotFound" => ChangeSetError::NotFound(message),
        Some((code, message)) => ChangeSetError::Api { code, message },
        None => ChangeSetError::Transport(err.to_string()),
    }
}

fn map_event_error<E>(err: SdkError<E, impl std::fmt::Debug>) -> EventError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error_parts(&err) {
        Some((code, message)) => EventError::Api { code, message },
        None => EventError::Transport(err.to_string()),
    }
}

/// The control plane reports a missing stack as a ValidationError rather
/// than a dedicated error shape.
fn is_stack_not_found<E>(err: &SdkError<E, impl std::fmt::Debug>) -> bool
where
    E: ProvideErrorMetadata,
{
    matches!(error_parts(err), Some((_, message)) if message.contains("does not exist"))
}

// =============================================================================
// Type Conversions
// =============================================================================

fn to_sdk_capability(capability: Capability) -> sdk::Capability {
    match capability {
        Capability::Iam => sdk::Capability::CapabilityIam,
        Capability::NamedIam => sdk::Capability::CapabilityNamedIam,
    }
}

fn to_sdk_change_set_type(change_set_type: ChangeSetType) -> sdk::ChangeSetType {
    match change_set_type {
        ChangeSetType::Create => sdk::ChangeSetType::Create,
        ChangeSetType::Update => sdk::ChangeSetType::Update,
    }
}

fn to_sdk_parameter(parameter: &Parameter) -> sdk::Parameter {
    sdk::Parameter::builder()
        .parameter_key(&parameter.key)
        .parameter_value(&parameter.value)
        .build()
}

fn from_sdk_timestamp(timestamp: Option<&SdkDateTime>) -> DateTime<Utc> {
    timestamp
        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_default()
}

fn from_sdk_stack(stack: &sdk::Stack) -> Result<StackDetails, StackError> {
    let name = stack.stack_name().unwrap_or_default();
    let name = StackName::new(name).map_err(|e| StackError::Api {
        code: "MalformedResponse".to_string(),
        message: format!("stack name in describe response is invalid: {e}"),
    })?;

    let outputs = stack
        .outputs()
        .iter()
        .filter_map(|o| {
            let key = o.output_key()?.to_string();
            let value = o.output_value()?.to_string();
            Some((key, value))
        })
        .collect();

    Ok(StackDetails {
        stack_id: StackId::new(stack.stack_id().unwrap_or_default()),
        name,
        status: StackStatus::parse(
            stack.stack_status().map(|s| s.as_str()).unwrap_or_default(),
        ),
        status_reason: stack.stack_status_reason().map(str::to_string),
        outputs,
    })
}

fn from_sdk_change(change: &sdk::Change) -> Option<ResourceChange> {
    let resource = change.resource_change()?;
    Some(ResourceChange {
        action: resource
            .action()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default(),
        logical_id: resource.logical_resource_id().unwrap_or_default().to_string(),
        resource_type: resource.resource_type().unwrap_or_default().to_string(),
    })
}

fn from_sdk_event(event: &sdk::StackEvent) -> StackEvent {
    StackEvent {
        event_id: event.event_id().unwrap_or_default().to_string(),
        timestamp: from_sdk_timestamp(event.timestamp()),
        stack_name: event.stack_name().unwrap_or_default().to_string(),
        logical_resource_id: event.logical_resource_id().map(str::to_string),
        resource_type: event.resource_type().map(str::to_string),
        resource_status: event.resource_status().map(|s| s.as_str().to_string()),
        resource_status_reason: event.resource_status_reason().map(str::to_string),
    }
}

// =============================================================================
// Client
// =============================================================================

/// Control plane client backed by the AWS SDK.
pub struct AwsCloudFormation {
    client: aws_sdk_cloudformation::Client,
}

impl AwsCloudFormation {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }

    /// Build a client for an environment using the default credential chain.
    pub async fn for_environment(environment: &Environment) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(environment.region.clone()))
            .load()
            .await;
        Self::new(aws_sdk_cloudformation::Client::new(&config))
    }
}

#[async_trait]
impl StackOps for AwsCloudFormation {
    async fn describe_stack(&self, name: &StackName) -> Result<Option<StackDetails>, StackError> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(name.as_str())
            .send()
            .await;

        match result {
            Ok(output) => match output.stacks().first() {
                Some(stack) => Ok(Some(from_sdk_stack(stack)?)),
                None => Ok(None),
            },
            Err(err) if is_stack_not_found(&err) => Ok(None),
            Err(err) => Err(map_stack_error(err)),
        }
    }

    async fn delete_stack(
        &self,
        name: &StackName,
        role_arn: Option<&str>,
    ) -> Result<(), StackError> {
        self.client
            .delete_stack()
            .stack_name(name.as_str())
            .set_role_arn(role_arn.map(str::to_string))
            .send()
            .await
            .map_err(map_stack_error)?;
        Ok(())
    }
}

#[async_trait]
impl ChangeSetOps for AwsCloudFormation {
    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<ChangeSetId, ChangeSetError> {
        let mut builder = self
            .client
            .create_change_set()
            .stack_name(request.stack_name.as_str())
            .change_set_name(&request.change_set_name)
            .change_set_type(to_sdk_change_set_type(request.change_set_type))
            .set_role_arn(request.role_arn.clone())
            .set_parameters(Some(
                request.parameters.iter().map(to_sdk_parameter).collect(),
            ));

        for capability in &request.capabilities {
            builder = builder.capabilities(to_sdk_capability(*capability));
        }

        builder = match &request.template {
            TemplateBody::Inline(body) => builder.template_body(body),
            TemplateBody::Url(url) => builder.template_url(url),
        };

        let output = builder.send().await.map_err(map_change_set_error)?;
        Ok(ChangeSetId::new(output.id().unwrap_or_default()))
    }

    async fn describe_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<ChangeSetDescription, ChangeSetError> {
        let output = self
            .client
            .describe_change_set()
            .stack_name(stack_name.as_str())
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(map_change_set_error)?;

        Ok(ChangeSetDescription {
            change_set_id: ChangeSetId::new(output.change_set_id().unwrap_or_default()),
            stack_id: StackId::new(output.stack_id().unwrap_or_default()),
            status: ChangeSetStatus::parse(
                output.status().map(|s| s.as_str()).unwrap_or_default(),
            ),
            status_reason: output.status_reason().map(str::to_string),
            changes: output.changes().iter().filter_map(from_sdk_change).collect(),
        })
    }

    async fn execute_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<(), ChangeSetError> {
        self.client
            .execute_change_set()
            .stack_name(stack_name.as_str())
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(map_change_set_error)?;
        Ok(())
    }

    async fn delete_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<(), ChangeSetError> {
        self.client
            .delete_change_set()
            .stack_name(stack_name.as_str())
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(map_change_set_error)?;
        Ok(())
    }
}

#[async_trait]
impl StackEventOps for AwsCloudFormation {
    async fn recent_stack_events(
        &self,
        name: &StackName,
    ) -> Result<Vec<StackEvent>, EventError> {
        let output = self
            .client
            .describe_stack_events()
            .stack_name(name.as_str())
            .send()
            .await
            .map_err(map_event_error)?;

        Ok(output.stack_events().iter().map(from_sdk_event).collect())
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Client factory over the default AWS credential chain.
///
/// The chain resolves one set of credentials for reads and writes, so the
/// requested mode does not change the constructed client.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsProviderFactory;

#[async_trait]
impl ProviderFactory for AwsProviderFactory {
    type Provider = AwsCloudFormation;

    async fn cloud_formation(
        &self,
        environment: &Environment,
        _mode: Mode,
    ) -> Result<Arc<Self::Provider>, FactoryError> {
        Ok(Arc::new(AwsCloudFormation::for_environment(environment).await))
    }
}
