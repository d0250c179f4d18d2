// ABOUTME: Composable capability traits for the control plane client.
// ABOUTME: Defines StackOps, ChangeSetOps, StackEventOps, and the client factory.

mod change_sets;
mod events;
mod factory;
mod shared_types;
mod stacks;

pub use change_sets::{ChangeSetError, ChangeSetOps};
pub use events::{EventError, StackEventOps};
pub use factory::{CloudFormationOps, FactoryError, Mode, ProviderFactory};
pub use shared_types::*;
pub use stacks::{StackError, StackOps};
