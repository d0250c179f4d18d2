// ABOUTME: Stack deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, transitions, poller, monitor, and orchestrator.

mod deployment;
mod descriptor;
mod error;
mod monitor;
mod orchestrator;
mod poll;
mod state;
mod transitions;

pub use deployment::StackDeployment;
pub use descriptor::{DeployOptions, DeployResult, StackDescriptor};
pub use error::DeployError;
pub use monitor::StackActivityMonitor;
pub use orchestrator::{deploy_stack, destroy_stack};
pub use poll::{Expect, wait_for_stack};
pub use state::{ChangeSetReady, Executed, Initialized, TemplateResolved};
pub use transitions::ChangeSetOutcome;
