// ABOUTME: Test support utilities.
// ABOUTME: Scripted control plane mock, in-memory asset store, and fixtures.

// Each test binary only uses part of this module, so allow dead_code.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Once;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use stiva::deploy::StackDescriptor;
use stiva::provider::{
    ChangeSetDescription, ChangeSetError, ChangeSetOps, ChangeSetRequest, ChangeSetStatus,
    EventError, FactoryError, Mode, ProviderFactory, ResourceChange, StackDetails, StackError,
    StackEvent, StackEventOps, StackOps, StackStatus,
};
use stiva::storage::{AssetStore, StorageError, Upload, UploadOptions, asset_key};
use stiva::types::{ChangeSetId, Environment, StackId, StackName};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("stiva=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

// =============================================================================
// Scripted control plane mock
// =============================================================================

/// Control plane mock driven by scripted response queues.
///
/// Describe queues replay their last element once drained so polling loops
/// observe a stable final state. Every call is recorded for assertions.
#[derive(Default)]
pub struct MockCloudFormation {
    describe_stack: Mutex<VecDeque<Option<StackDetails>>>,
    describe_change_set: Mutex<VecDeque<ChangeSetDescription>>,
    events: Mutex<Vec<StackEvent>>,
    calls: Mutex<Vec<String>>,
    change_set_requests: Mutex<Vec<ChangeSetRequest>>,
}

impl MockCloudFormation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next describe-stack response.
    pub fn queue_stack(&self, details: Option<StackDetails>) {
        self.describe_stack.lock().push_back(details);
    }

    /// Queue the next describe-change-set response.
    pub fn queue_change_set(&self, description: ChangeSetDescription) {
        self.describe_change_set.lock().push_back(description);
    }

    /// Add an event returned by every subsequent event fetch.
    pub fn push_event(&self, event: StackEvent) {
        self.events.lock().push(event);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// All change set creation requests, in order.
    pub fn change_set_requests(&self) -> Vec<ChangeSetRequest> {
        self.change_set_requests.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

fn next_scripted<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = queue.lock();
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl StackOps for MockCloudFormation {
    async fn describe_stack(&self, name: &StackName) -> Result<Option<StackDetails>, StackError> {
        self.record(format!("describe_stack:{name}"));
        Ok(next_scripted(&self.describe_stack).flatten())
    }

    async fn delete_stack(
        &self,
        name: &StackName,
        _role_arn: Option<&str>,
    ) -> Result<(), StackError> {
        self.record(format!("delete_stack:{name}"));
        Ok(())
    }
}

#[async_trait]
impl ChangeSetOps for MockCloudFormation {
    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<ChangeSetId, ChangeSetError> {
        self.record(format!(
            "create_change_set:{}:{}",
            request.stack_name, request.change_set_type
        ));
        self.change_set_requests.lock().push(request.clone());
        Ok(ChangeSetId::new("arn:aws:cloudformation:::changeSet/mock"))
    }

    async fn describe_change_set(
        &self,
        stack_name: &StackName,
        change_set_name: &str,
    ) -> Result<ChangeSetDescription, ChangeSetError> {
        self.record(format!("describe_change_set:{stack_name}"));
        next_scripted(&self.describe_change_set)
            .ok_or_else(|| ChangeSetError::NotFound(change_set_name.to_string()))
    }

    async fn execute_change_set(
        &self,
        stack_name: &StackName,
        _change_set_name: &str,
    ) -> Result<(), ChangeSetError> {
        self.record(format!("execute_change_set:{stack_name}"));
        Ok(())
    }

    async fn delete_change_set(
        &self,
        stack_name: &StackName,
        _change_set_name: &str,
    ) -> Result<(), ChangeSetError> {
        self.record(format!("delete_change_set:{stack_name}"));
        Ok(())
    }
}

#[async_trait]
impl StackEventOps for MockCloudFormation {
    async fn recent_stack_events(
        &self,
        name: &StackName,
    ) -> Result<Vec<StackEvent>, EventError> {
        self.record(format!("recent_stack_events:{name}"));
        // Newest first, like the control plane.
        let mut events = self.events.lock().clone();
        events.reverse();
        Ok(events)
    }
}

/// Factory handing out a shared mock provider.
pub struct MockFactory {
    pub provider: Arc<MockCloudFormation>,
}

impl MockFactory {
    pub fn new(provider: Arc<MockCloudFormation>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProviderFactory for MockFactory {
    type Provider = MockCloudFormation;

    async fn cloud_formation(
        &self,
        _environment: &Environment,
        _mode: Mode,
    ) -> Result<Arc<Self::Provider>, FactoryError> {
        Ok(Arc::clone(&self.provider))
    }
}

// =============================================================================
// In-memory asset store
// =============================================================================

/// Asset store keeping objects in a map, for upload assertions.
#[derive(Default)]
pub struct MemoryAssetStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<usize>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    /// Number of uploads that actually stored content.
    pub fn upload_count(&self) -> usize {
        *self.uploads.lock()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload_if_changed(
        &self,
        content: &[u8],
        options: &UploadOptions,
    ) -> Result<Upload, StorageError> {
        let key = asset_key(content, options);
        let mut objects = self.objects.lock();
        if objects.contains_key(&key) {
            return Ok(Upload { key, existed: true });
        }
        objects.insert(key.clone(), content.to_vec());
        *self.uploads.lock() += 1;
        Ok(Upload {
            key,
            existed: false,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://assets.example.test/{key}")
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn environment() -> Environment {
    Environment::new("123456789012", "us-east-1")
}

pub fn descriptor(name: &str) -> StackDescriptor {
    let template = json!({
        "Resources": {
            "Bucket": { "Type": "AWS::S3::Bucket" }
        },
        "Outputs": {
            "BucketName": { "Value": { "Ref": "Bucket" } }
        }
    });
    StackDescriptor::new(StackName::new(name).unwrap(), template)
        .with_environment(environment())
}

pub fn stack_details(name: &str, status: StackStatus) -> StackDetails {
    let mut outputs = HashMap::new();
    outputs.insert("BucketName".to_string(), "demo-bucket".to_string());
    StackDetails {
        stack_id: StackId::new(format!(
            "arn:aws:cloudformation:us-east-1:123456789012:stack/{name}/mock"
        )),
        name: StackName::new(name).unwrap(),
        status,
        status_reason: None,
        outputs,
    }
}

pub fn ready_change_set(changes: usize) -> ChangeSetDescription {
    ChangeSetDescription {
        change_set_id: ChangeSetId::new("arn:aws:cloudformation:::changeSet/mock"),
        stack_id: StackId::new(
            "arn:aws:cloudformation:us-east-1:123456789012:stack/demo/mock",
        ),
        status: ChangeSetStatus::CreateComplete,
        status_reason: None,
        changes: (0..changes)
            .map(|i| ResourceChange {
                action: "Add".to_string(),
                logical_id: format!("Resource{i}"),
                resource_type: "AWS::S3::Bucket".to_string(),
            })
            .collect(),
    }
}

pub fn empty_change_set() -> ChangeSetDescription {
    ready_change_set(0)
}

pub fn failed_change_set(reason: &str) -> ChangeSetDescription {
    ChangeSetDescription {
        status: ChangeSetStatus::Failed,
        status_reason: Some(reason.to_string()),
        ..ready_change_set(0)
    }
}

pub fn stack_event(id: &str, timestamp: DateTime<Utc>, status: &str) -> StackEvent {
    StackEvent {
        event_id: id.to_string(),
        timestamp,
        stack_name: "demo".to_string(),
        logical_resource_id: Some("Bucket".to_string()),
        resource_type: Some("AWS::S3::Bucket".to_string()),
        resource_status: Some(status.to_string()),
        resource_status_reason: None,
    }
}
