//! The One Trait: StackBackend
//!
//! This is the single abstraction point for the remote control plane.
//! The reconciliation engine is pure logic — it doesn't know about
//! HTTP, signing, or regions. That's the implementor's problem.
//!
//! Two implementations ship with the crate: [`crate::client::RusotoStackBackend`]
//! against the real CloudFormation API (behind the `rusoto-client` feature)
//! and [`crate::fake::FakeStackBackend`], a deterministic in-memory fake for
//! tests.

use crate::error::CfnError;
use crate::types::{ChangeSetSummary, ChangeSetType, StackDescription, StackEvent, StackSpec};
use std::future::Future;

/// One method per remote operation the engine performs. Every method is a
/// single call against the control plane; retry and backoff live in
/// [`crate::retry::Retrier`], never here.
pub trait StackBackend: Send + Sync {
    /// Describe the named stack. Errors for any reason — including the stack
    /// not existing; the resolver conflates the two deliberately.
    fn describe_stack(
        &self,
        stack_name: &str,
    ) -> impl Future<Output = Result<StackDescription, CfnError>> + Send;

    /// Create the stack from the spec's template, parameters, tags and
    /// capabilities.
    fn create_stack(
        &self,
        spec: &StackSpec,
    ) -> impl Future<Output = Result<(), CfnError>> + Send;

    /// Update the existing stack to the spec's content. A no-change update
    /// fails with a validation error the dispatcher recognizes.
    fn update_stack(
        &self,
        spec: &StackSpec,
    ) -> impl Future<Output = Result<(), CfnError>> + Send;

    /// Delete the named stack.
    fn delete_stack(
        &self,
        stack_name: &str,
    ) -> impl Future<Output = Result<(), CfnError>> + Send;

    /// Stage a changeset for the spec's stack.
    fn create_change_set(
        &self,
        spec: &StackSpec,
        change_set_name: &str,
        change_set_type: ChangeSetType,
    ) -> impl Future<Output = Result<(), CfnError>> + Send;

    /// List the changesets currently associated with the named stack.
    fn list_change_sets(
        &self,
        stack_name: &str,
    ) -> impl Future<Output = Result<Vec<ChangeSetSummary>, CfnError>> + Send;

    /// Execute a previously staged changeset.
    fn execute_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> impl Future<Output = Result<(), CfnError>> + Send;

    /// Fetch the stack's event history, newest first. Errors once the stack
    /// is gone — which is how the poller confirms a delete.
    fn describe_stack_events(
        &self,
        stack_name: &str,
    ) -> impl Future<Output = Result<Vec<StackEvent>, CfnError>> + Send;
}
