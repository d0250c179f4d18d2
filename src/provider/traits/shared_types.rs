// ABOUTME: Shared types for control plane operations.
// ABOUTME: Stack status lifecycle, change set requests, events, and outputs.

use crate::template::TemplateBody;
use crate::types::{ChangeSetId, StackId, StackName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle status of a stack as observed from the control plane.
///
/// Never mutated by this crate, only parsed from describe responses.
/// Unrecognized statuses are preserved in `Other` rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    UpdateInProgress,
    UpdateCompleteCleanupInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackInProgress,
    UpdateRollbackFailed,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    ReviewInProgress,
    Other(String),
}

impl StackStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_FAILED" => Self::CreateFailed,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => Self::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => Self::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => Self::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                Self::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => Self::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => Self::ReviewInProgress,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            Self::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            Self::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            Self::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::Other(s) => s,
        }
    }

    /// A terminal status: no further transition without new operator action.
    pub fn is_terminal(&self) -> bool {
        !self.as_str().ends_with("_IN_PROGRESS")
    }

    /// The stack reached the successful end of a create or update.
    pub fn is_deploy_success(&self) -> bool {
        matches!(self, Self::CreateComplete | Self::UpdateComplete)
    }

    /// The stack got stuck during its initial creation and must be deleted
    /// before a new create can proceed. ROLLBACK_COMPLETE only occurs after a
    /// failed first create, so deleting it cannot lose a live stack.
    pub fn is_failed_creation(&self) -> bool {
        matches!(
            self,
            Self::CreateFailed | Self::RollbackComplete | Self::RollbackFailed
        )
    }

    pub fn is_delete_complete(&self) -> bool {
        matches!(self, Self::DeleteComplete)
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a stack from a describe call.
#[derive(Debug, Clone)]
pub struct StackDetails {
    pub stack_id: StackId,
    pub name: StackName,
    pub status: StackStatus,
    pub status_reason: Option<String>,
    /// Stack output key/value mapping.
    pub outputs: HashMap<String, String>,
}

/// A template parameter passed to a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Elevated capabilities a change set may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Iam,
    NamedIam,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iam => write!(f, "CAPABILITY_IAM"),
            Self::NamedIam => write!(f, "CAPABILITY_NAMED_IAM"),
        }
    }
}

/// Whether the change set creates a new stack or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetType {
    Create,
    Update,
}

impl fmt::Display for ChangeSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
        }
    }
}

/// A fully specified change set creation request.
///
/// Every recognized field is explicit; there is no pass-through property bag.
#[derive(Debug, Clone)]
pub struct ChangeSetRequest {
    pub stack_name: StackName,
    /// Unique per execution; derived from a fresh execution id.
    pub change_set_name: String,
    pub change_set_type: ChangeSetType,
    pub template: TemplateBody,
    pub parameters: Vec<Parameter>,
    pub role_arn: Option<String>,
    /// Always includes the IAM capabilities: templates may carry managed
    /// policies and the control plane rejects them without the flags.
    pub capabilities: Vec<Capability>,
}

/// Status of a change set as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetStatus {
    CreatePending,
    CreateInProgress,
    CreateComplete,
    DeleteComplete,
    Failed,
    Other(String),
}

impl ChangeSetStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "CREATE_PENDING" => Self::CreatePending,
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreatePending => "CREATE_PENDING",
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::Failed => "FAILED",
            Self::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::CreatePending | Self::CreateInProgress)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::CreateComplete)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ChangeSetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One proposed resource change inside a change set.
#[derive(Debug, Clone)]
pub struct ResourceChange {
    /// Add, Modify, or Remove.
    pub action: String,
    pub logical_id: String,
    pub resource_type: String,
}

/// The computed contents of a change set.
///
/// An empty `changes` list is the no-op sentinel: the submitted template
/// produces no difference against the running stack.
#[derive(Debug, Clone)]
pub struct ChangeSetDescription {
    pub change_set_id: ChangeSetId,
    pub stack_id: StackId,
    pub status: ChangeSetStatus,
    pub status_reason: Option<String>,
    pub changes: Vec<ResourceChange>,
}

/// One entry from the stack event stream.
#[derive(Debug, Clone)]
pub struct StackEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub stack_name: String,
    pub logical_resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_status: Option<String>,
    pub resource_status_reason: Option<String>,
}

impl StackEvent {
    /// Whether this event reports a resource failure.
    pub fn is_failure(&self) -> bool {
        self.resource_status
            .as_deref()
            .is_some_and(|s| s.ends_with("_FAILED"))
    }
}
