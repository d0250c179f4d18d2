// ABOUTME: Client factory trait producing environment-scoped control plane clients.
// ABOUTME: Replaces ambient credential singletons with an explicit parameter.

use super::change_sets::ChangeSetOps;
use super::events::StackEventOps;
use super::stacks::StackOps;
use crate::types::Environment;
use async_trait::async_trait;
use std::sync::Arc;

/// Everything the deploy orchestrator needs from a control plane client.
pub trait CloudFormationOps: StackOps + ChangeSetOps + StackEventOps {}

impl<T: StackOps + ChangeSetOps + StackEventOps> CloudFormationOps for T {}

/// What the client will be used for. Factories may resolve different
/// credentials for reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ForReading,
    ForWriting,
}

/// Produces authenticated clients scoped to a resolved environment.
///
/// Credential acquisition lives behind this boundary; the orchestrator only
/// ever asks for a client, never for credentials.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    type Provider: CloudFormationOps + Send + Sync + 'static;

    async fn cloud_formation(
        &self,
        environment: &Environment,
        mode: Mode,
    ) -> Result<Arc<Self::Provider>, FactoryError>;
}

/// Errors from client construction.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("no client available for environment {environment}: {reason}")]
    ClientUnavailable {
        environment: String,
        reason: String,
    },
}
