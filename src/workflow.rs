//! The resource flows: check and put.
//!
//! Control flow is resolve → dispatch → poll → fingerprint. Dispatch
//! errors are logged and polling still runs — the event stream, not the
//! dispatch call, decides whether the deployment succeeded. The one
//! exception is the changeset count mismatch, which aborts the invocation.

use crate::backend::StackBackend;
use crate::dispatch::dispatch;
use crate::error::CfnError;
use crate::poll::{EventPoller, PollConfig};
use crate::resolve::resolve_stack_state;
use crate::retry::{Retrier, RetryPolicy};
use crate::types::StackSpec;
use crate::version::{check_versions, fingerprint};
use tracing::warn;

/// Knobs for one invocation. Defaults reproduce the classic behavior:
/// unbounded backoff, unbounded poll.
#[derive(Debug, Clone, Default)]
pub struct ResourceConfig {
    pub retry: RetryPolicy,
    pub poll: PollConfig,
}

/// Outcome of a put: the terminal poll snapshot plus the content
/// fingerprint of what was deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    pub succeeded: bool,
    pub arn: String,
    pub timestamp: String,
    pub fingerprint: String,
}

/// The check flow: resolve the remote stack and report the version list.
pub async fn check<B: StackBackend>(
    backend: &B,
    config: &ResourceConfig,
    stack_name: &str,
    previous: &str,
) -> Vec<String> {
    let retrier = Retrier::new(config.retry.clone());
    let remote = resolve_stack_state(backend, &retrier, stack_name).await;
    check_versions(previous, &remote)
}

/// The put flow: execute the requested stack action, wait for the terminal
/// event, and label the result with its content fingerprint.
pub async fn put<B: StackBackend>(
    backend: &B,
    config: &ResourceConfig,
    spec: &StackSpec,
) -> Result<PutOutcome, CfnError> {
    let retrier = Retrier::new(config.retry.clone());
    let remote = resolve_stack_state(backend, &retrier, &spec.stack_name).await;

    if let Err(err) = dispatch(backend, &retrier, spec, &remote).await {
        if let CfnError::ChangeSetCount(_) = err {
            return Err(err);
        }
        // Not fatal here; polling decides the real outcome.
        warn!(stack = %spec.stack_name, error = %err, "stack action failed");
    }

    let poller = EventPoller::new(backend, &retrier, config.poll.clone());
    let result = poller.wait_for_stack(&spec.stack_name, spec.delete).await;

    Ok(PutOutcome {
        succeeded: result.success,
        arn: result.arn,
        timestamp: result.timestamp,
        fingerprint: fingerprint(&spec.template_body, &spec.parameters, &spec.tags),
    })
}
