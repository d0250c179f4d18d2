// ABOUTME: Deploy inputs and outputs: stack descriptor, options, and result.
// ABOUTME: Descriptors are immutable caller-owned inputs; results are produced once.

use crate::provider::Parameter;
use crate::template::TemplateDocument;
use crate::types::{Environment, StackId, StackName};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// A synthesized stack ready to be deployed.
///
/// Synthesis happens upstream; this is the orchestrator's opaque input.
#[derive(Debug, Clone, Deserialize)]
pub struct StackDescriptor {
    #[serde(deserialize_with = "deserialize_stack_name")]
    pub name: StackName,

    /// Target account and region. Deploys fail fast when unresolved.
    #[serde(default)]
    pub environment: Option<Environment>,

    /// The template document to deploy.
    pub template: TemplateDocument,

    /// Construct paths by logical resource id, used to label activity.
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl StackDescriptor {
    pub fn new(name: StackName, template: TemplateDocument) -> Self {
        Self {
            name,
            environment: None,
            template,
            metadata: HashMap::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }
}

/// Options shared by deploy and destroy.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployOptions {
    /// Execution role passed to the control plane, if any.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Deploy under this name instead of the stack's own name.
    #[serde(default, deserialize_with = "deserialize_optional_stack_name")]
    pub deploy_name: Option<StackName>,

    /// Suppress the activity monitor. Observability only; the deploy
    /// behaves identically.
    #[serde(default)]
    pub quiet: bool,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            role_arn: None,
            deploy_name: None,
            quiet: false,
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

/// Outcome of a completed deploy.
#[derive(Debug, Clone)]
pub struct DeployResult {
    /// True when the change set contained no changes.
    pub no_op: bool,
    /// Stack output key/value mapping observed after completion.
    pub outputs: HashMap<String, String>,
    /// The deployed stack's identifier.
    pub stack_id: StackId,
}

// Custom deserializers

fn deserialize_stack_name<'de, D>(deserializer: D) -> Result<StackName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    StackName::new(&s).map_err(serde::de::Error::custom)
}

fn deserialize_optional_stack_name<'de, D>(
    deserializer: D,
) -> Result<Option<StackName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| StackName::new(&s).map_err(serde::de::Error::custom))
        .transpose()
}
