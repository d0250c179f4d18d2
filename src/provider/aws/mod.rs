// ABOUTME: AWS-backed provider implementation using the official SDK.
// ABOUTME: Implements the control plane traits over aws-sdk-cloudformation.

mod client;

pub use client::{AwsCloudFormation, AwsProviderFactory};
