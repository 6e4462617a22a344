//! Event polling: block until the stack reaches a terminal status.
//!
//! After dispatch, the stack's event history is fetched in a loop. A read
//! cursor keeps already-seen events from being reprocessed; the newest event
//! decides the state machine's transition, but only when it belongs to the
//! top-level stack resource — nested resource events never terminate the
//! poll. One special case: once a deleted stack is gone, describe-events
//! itself fails, and that failure is the confirmation of deletion.

use crate::backend::StackBackend;
use crate::retry::Retrier;
use crate::types::StackEvent;
use crate::version::canonical_timestamp;
use std::time::Duration;
use tracing::{info, warn};

/// The resource type of the stack itself in its event stream.
pub const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// Poll loop configuration. The default reproduces the classic behavior:
/// 500 ms between fetches, no deadline.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// Give up (as a failure) once this much time has passed. `None` polls
    /// until a terminal event arrives, however long that takes.
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: None,
        }
    }
}

/// Poll state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Success,
    Failure,
}

/// Terminal snapshot after polling: outcome plus the stack ARN and the
/// timestamp of the event that ended the poll, in canonical text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub success: bool,
    pub arn: String,
    pub timestamp: String,
}

/// Classify a top-level stack resource status.
pub fn classify_stack_status(status: &str) -> PollState {
    match status {
        "CREATE_COMPLETE" | "UPDATE_COMPLETE" => PollState::Success,
        "ROLLBACK_COMPLETE" | "UPDATE_ROLLBACK_COMPLETE" => PollState::Failure,
        s if s.ends_with("_FAILED") => PollState::Failure,
        _ => PollState::Polling,
    }
}

pub struct EventPoller<'a, B: StackBackend> {
    backend: &'a B,
    retrier: &'a Retrier,
    config: PollConfig,
}

impl<'a, B: StackBackend> EventPoller<'a, B> {
    pub fn new(backend: &'a B, retrier: &'a Retrier, config: PollConfig) -> Self {
        Self {
            backend,
            retrier,
            config,
        }
    }

    /// Block until the named stack reaches a terminal status, or — when
    /// `deleting` — until the event history itself disappears.
    pub async fn wait_for_stack(&self, stack_name: &str, deleting: bool) -> PollResult {
        let started = tokio::time::Instant::now();
        let mut seen: usize = 0;
        let mut arn = String::new();
        let mut timestamp = String::new();

        loop {
            let events = match self
                .retrier
                .execute(|| self.backend.describe_stack_events(stack_name))
                .await
            {
                Ok(events) => events,
                Err(err) if deleting => {
                    info!(stack = %stack_name, "stack deleted ({err})");
                    return PollResult {
                        success: true,
                        arn,
                        timestamp,
                    };
                }
                Err(err) => {
                    warn!(stack = %stack_name, error = %err, "could not fetch stack events");
                    return PollResult {
                        success: false,
                        arn,
                        timestamp,
                    };
                }
            };

            // Surface events not yet seen, oldest first, and advance the
            // cursor so the next fetch only reports what is new.
            if events.len() > seen {
                for event in events.iter().take(events.len() - seen).rev() {
                    log_event(event);
                }
                seen = events.len();
            }

            if let Some(newest) = events.first() {
                arn = newest.stack_id.clone();
                timestamp = canonical_timestamp(&newest.timestamp);

                if newest.resource_type == STACK_RESOURCE_TYPE {
                    match classify_stack_status(&newest.resource_status) {
                        PollState::Success => {
                            return PollResult {
                                success: true,
                                arn,
                                timestamp,
                            }
                        }
                        PollState::Failure => {
                            return PollResult {
                                success: false,
                                arn,
                                timestamp,
                            }
                        }
                        PollState::Polling => {}
                    }
                }
            }

            if let Some(deadline) = self.config.deadline {
                if started.elapsed() >= deadline {
                    warn!(stack = %stack_name, "poll deadline exceeded");
                    return PollResult {
                        success: false,
                        arn,
                        timestamp,
                    };
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }
    }
}

fn log_event(event: &StackEvent) {
    info!(
        resource = %event.resource_type,
        status = %event.resource_status,
        at = %event.timestamp,
        "stack event"
    );
}
