//! Minimal domain and wire types for the CloudFormation resource.
//!
//! These are the types the reconciliation engine needs. Nothing more.
//! Wire shapes (the Concourse resource protocol and the parameter/tag
//! file formats) keep the field names of the JSON they travel as.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════
// DESIRED STATE
// ═══════════════════════════════════════════════════════════════════

/// A template parameter. Serialized form matches the parameters file shape
/// (`[{"ParameterKey": ..., "ParameterValue": ..., "UsePreviousValue": ...}]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
    #[serde(rename = "UsePreviousValue", default)]
    pub use_previous_value: bool,
}

/// A stack tag. Serialized form matches the tags file shape
/// (`[{"TagKey": ..., "TagValue": ...}]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "TagKey")]
    pub key: String,
    #[serde(rename = "TagValue")]
    pub value: String,
}

/// Everything one invocation wants the remote stack to become: identity,
/// content, and which of the five actions to take. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSpec {
    /// Stack name — the sole identity key for every remote operation.
    pub stack_name: String,
    /// Template body text.
    pub template_body: String,
    pub parameters: Vec<Parameter>,
    pub tags: Vec<Tag>,
    pub capabilities: Vec<String>,

    // Action flags. Delete wins; the changeset pair comes next; otherwise
    // create-or-update is decided from the remote state.
    pub delete: bool,
    pub changeset_create: bool,
    pub changeset_execute: bool,
}

impl StackSpec {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template_body: String::new(),
            parameters: Vec::new(),
            tags: Vec::new(),
            capabilities: Vec::new(),
            delete: false,
            changeset_create: false,
            changeset_execute: false,
        }
    }

    pub fn with_template(mut self, body: impl Into<String>) -> Self {
        self.template_body = body.into();
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════
// REMOTE STATE
// ═══════════════════════════════════════════════════════════════════

/// What a describe call reports about an existing stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    pub stack_id: Option<String>,
    pub stack_status: String,
    /// Absent on a stack that has been created but never updated.
    pub last_updated_time: Option<DateTime<Utc>>,
}

/// One entry from the stack's event history. The control plane returns
/// these newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEvent {
    /// The stack ARN.
    pub stack_id: String,
    pub resource_type: String,
    pub resource_status: String,
    pub timestamp: DateTime<Utc>,
}

/// A changeset as reported by the list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetSummary {
    pub name: String,
    pub status: String,
}

/// Whether a changeset targets an existing stack or creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetType {
    Create,
    Update,
}

impl ChangeSetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSetType::Create => "CREATE",
            ChangeSetType::Update => "UPDATE",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// RESOURCE PROTOCOL
// ═══════════════════════════════════════════════════════════════════

/// The `source` block of the resource configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(default)]
    pub aws_access_key_id: String,
    #[serde(default)]
    pub aws_secret_access_key: String,
    #[serde(default)]
    pub region: String,
}

/// A version marker as it crosses the wire: the remote stack's
/// last-modification timestamp in its canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    #[serde(rename = "LastUpdatedTime")]
    pub last_updated_time: String,
}

/// The `params` block of an out step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutParams {
    /// Path to the template file, relative to the build directory.
    #[serde(default)]
    pub template: Option<String>,
    /// Path to the parameters JSON file.
    #[serde(default)]
    pub parameters: Option<String>,
    /// Path to the tags JSON file.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub delete: bool,
    /// Accepted for configuration compatibility; polling always runs.
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub changeset_create: bool,
    #[serde(default)]
    pub changeset_execute: bool,
}

/// Full check request: source plus the previously emitted version, if any.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInput {
    pub source: Source,
    #[serde(default)]
    pub version: Option<Version>,
}

/// Full out request.
#[derive(Debug, Clone, Deserialize)]
pub struct OutInput {
    pub source: Source,
    #[serde(default)]
    pub params: OutParams,
}

/// One `{name, value}` pair in the out response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// The version an out step emits: the content fingerprint of what was
/// deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintVersion {
    pub sha1: String,
}

/// The full out response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    pub version: FingerprintVersion,
    pub metadata: Vec<MetadataField>,
}
