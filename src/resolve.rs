//! Remote stack state resolution.
//!
//! One describe call answers the two questions the dispatcher and the check
//! flow need: does the stack exist, and when was it last updated?
//!
//! Any describe failure is treated as non-existence. The source of truth
//! for this resource has always conflated "stack truly absent" with
//! "describe failed", and downstream version semantics depend on it (a
//! failed describe yields an empty version list, not an error). A failure
//! that does not look like not-found is logged at warn level so transient
//! errors are at least visible to the operator.

use crate::backend::StackBackend;
use crate::retry::Retrier;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Freshly resolved remote existence and modification time. Never cached
/// across invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStackStatus {
    pub exists: bool,
    /// `None` for a stack that exists but has never been updated.
    pub last_updated_time: Option<DateTime<Utc>>,
}

impl RemoteStackStatus {
    pub fn absent() -> Self {
        Self {
            exists: false,
            last_updated_time: None,
        }
    }
}

/// Describe the named stack through the retrier and fold the answer into a
/// [`RemoteStackStatus`].
pub async fn resolve_stack_state<B: StackBackend>(
    backend: &B,
    retrier: &Retrier,
    stack_name: &str,
) -> RemoteStackStatus {
    match retrier.execute(|| backend.describe_stack(stack_name)).await {
        Ok(description) => RemoteStackStatus {
            exists: true,
            last_updated_time: description.last_updated_time,
        },
        Err(err) if err.looks_not_found() => {
            debug!(stack = %stack_name, "stack does not exist");
            RemoteStackStatus::absent()
        }
        Err(err) => {
            warn!(stack = %stack_name, error = %err, "describe failed, treating stack as absent");
            RemoteStackStatus::absent()
        }
    }
}
