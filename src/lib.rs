//! CloudFormation CI Resource Library
//!
//! Stack reconciliation engine for a Concourse-style CI resource: it
//! converges one named CloudFormation stack on a desired template plus
//! parameters/tags/capabilities, and reports a comparable version so the
//! pipeline can detect drift.
//!
//! # Design
//!
//! All remote access goes through the [`StackBackend`] trait — one method
//! per control-plane operation. The engine itself is pure logic: the
//! retrier absorbs rate limiting, the resolver answers "does the stack
//! exist and when did it last change", the dispatcher picks exactly one of
//! create/update/delete/changeset-create/changeset-execute, and the event
//! poller blocks until the stack's own resource reaches a terminal status.
//! The version computer labels a finished deployment with a content
//! fingerprint and turns remote timestamps into the check flow's version
//! list.
//!
//! # Usage
//!
//! ```ignore
//! use cfn_resource_rs::{put, check, ResourceConfig, StackSpec};
//! use cfn_resource_rs::client::RusotoStackBackend;
//!
//! let backend = RusotoStackBackend::from_source(&source)?;
//! let spec = StackSpec::new("my-stack")
//!     .with_template(template_body)
//!     .with_parameters(parameters);
//!
//! let outcome = put(&backend, &ResourceConfig::default(), &spec).await?;
//! println!("deployed {} as {}", outcome.arn, outcome.fingerprint);
//! ```

pub mod backend;
pub mod dispatch;
pub mod error;
pub mod fake;
pub mod inputs;
pub mod poll;
pub mod resolve;
pub mod retry;
pub mod types;
pub mod version;
pub mod workflow;

#[cfg(feature = "rusoto-client")]
pub mod client;

// Re-export the main types at crate root for convenience
pub use backend::StackBackend;
pub use error::CfnError;
pub use poll::{EventPoller, PollConfig, PollResult, PollState};
pub use resolve::{resolve_stack_state, RemoteStackStatus};
pub use retry::{Retrier, RetryPolicy};
pub use types::{
    ChangeSetSummary, ChangeSetType, CheckInput, FingerprintVersion, MetadataField, OutInput,
    OutParams, Parameter, PutResponse, Source, StackDescription, StackEvent, StackSpec, Tag,
    Version,
};
pub use version::{canonical_timestamp, check_versions, fingerprint};
pub use workflow::{check, put, PutOutcome, ResourceConfig};

#[cfg(feature = "rusoto-client")]
pub use client::RusotoStackBackend;
