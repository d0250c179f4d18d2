// ABOUTME: Generic stack deployment struct parameterized by state marker.
// ABOUTME: Carries descriptor, execution id, and change set handles across transitions.

use std::marker::PhantomData;

use crate::provider::ChangeSetType;
use crate::template::TemplateBody;
use crate::types::{ExecutionId, StackName};

use super::descriptor::StackDescriptor;
use super::state::{ChangeSetReady, Executed, Initialized};

/// A deployment in progress, parameterized by its current state.
///
/// The phantom state parameter makes illegal orderings unrepresentable:
/// a change set cannot be executed before it has been created, and the
/// template cannot be submitted before its body form is resolved.
#[derive(Debug)]
pub struct StackDeployment<S> {
    pub(crate) descriptor: StackDescriptor,
    pub(crate) deploy_name: StackName,
    pub(crate) execution_id: ExecutionId,
    pub(crate) role_arn: Option<String>,
    pub(crate) body: Option<TemplateBody>,
    pub(crate) change_set_name: Option<String>,
    pub(crate) change_set_type: Option<ChangeSetType>,
    pub(crate) change_count: Option<usize>,
    pub(crate) _state: PhantomData<S>,
}

impl StackDeployment<Initialized> {
    /// Begin a deployment attempt with a fresh execution id.
    pub fn new(
        descriptor: StackDescriptor,
        deploy_name: StackName,
        role_arn: Option<String>,
    ) -> Self {
        StackDeployment {
            descriptor,
            deploy_name,
            execution_id: ExecutionId::generate(),
            role_arn,
            body: None,
            change_set_name: None,
            change_set_type: None,
            change_count: None,
            _state: PhantomData,
        }
    }
}

impl<S> StackDeployment<S> {
    /// The name the stack is deployed under (override or the stack's own name).
    pub fn deploy_name(&self) -> &StackName {
        &self.deploy_name
    }

    /// This attempt's execution id.
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// The descriptor being deployed.
    pub fn descriptor(&self) -> &StackDescriptor {
        &self.descriptor
    }
}

impl StackDeployment<ChangeSetReady> {
    /// Name of the computed change set.
    pub fn change_set_name(&self) -> &str {
        self.change_set_name
            .as_deref()
            .expect("ready deployment must have a change set")
    }

    /// Number of resource changes the change set will apply.
    pub fn change_count(&self) -> usize {
        self.change_count
            .expect("ready deployment must have a change count")
    }

    /// Whether this change set creates a new stack.
    pub fn is_create(&self) -> bool {
        matches!(self.change_set_type, Some(ChangeSetType::Create))
    }
}

impl StackDeployment<Executed> {
    /// Number of resource changes being applied.
    pub fn change_count(&self) -> usize {
        self.change_count
            .expect("executed deployment must have a change count")
    }
}
