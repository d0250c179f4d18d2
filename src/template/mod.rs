// ABOUTME: Template document serialization and body representation.
// ABOUTME: Renders JSON template trees to YAML and enforces the inline size limit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest template the control plane accepts inline in a request body.
/// Anything bigger must be uploaded to toolkit storage and passed by URL.
pub const MAX_INLINE_TEMPLATE_BYTES: usize = 51_200;

/// An in-memory template document.
///
/// Synthesis happens upstream; this layer only serializes and ships it.
pub type TemplateDocument = serde_json::Value;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to serialize template: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// How the template reaches the control plane: inline text or a storage URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateBody {
    /// Serialized template passed directly in the request.
    Inline(String),
    /// URL of a previously uploaded template object.
    Url(String),
}

impl TemplateBody {
    pub fn is_url(&self) -> bool {
        matches!(self, TemplateBody::Url(_))
    }
}

/// Serialize a template document to YAML.
///
/// Value trees have no anchors or aliases, so nested references are already
/// flattened; output depth is bounded by the document itself.
pub fn to_yaml(template: &TemplateDocument) -> Result<String, TemplateError> {
    Ok(serde_yaml::to_string(template)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_yaml_mapping() {
        let doc = json!({
            "Resources": {
                "Bucket": { "Type": "AWS::S3::Bucket" }
            }
        });

        let yaml = to_yaml(&doc).unwrap();
        assert!(yaml.contains("Resources:"));
        assert!(yaml.contains("Type: AWS::S3::Bucket"));
    }

    #[test]
    fn inline_limit_matches_control_plane() {
        assert_eq!(MAX_INLINE_TEMPLATE_BYTES, 50 * 1024);
    }

    #[test]
    fn body_knows_its_form() {
        assert!(TemplateBody::Url("https://example.com/t.yml".into()).is_url());
        assert!(!TemplateBody::Inline("{}".into()).is_url());
    }
}
