//! Deterministic in-memory `StackBackend` for tests.
//!
//! Responses are scripted per operation as FIFO queues; once a queue runs
//! dry the fake falls back to a benign default (describe: not found,
//! mutations: success, events: repeat the last batch). Every call is
//! recorded so tests can assert exactly which remote operations ran.

use crate::backend::StackBackend;
use crate::error::CfnError;
use crate::types::{ChangeSetSummary, ChangeSetType, StackDescription, StackEvent, StackSpec};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    DescribeStack(String),
    CreateStack(String),
    UpdateStack(String),
    DeleteStack(String),
    CreateChangeSet {
        stack_name: String,
        change_set_type: ChangeSetType,
    },
    ListChangeSets(String),
    ExecuteChangeSet {
        stack_name: String,
        change_set_name: String,
    },
    DescribeStackEvents(String),
}

#[derive(Default)]
struct Inner {
    describe_results: VecDeque<Result<StackDescription, CfnError>>,
    create_results: VecDeque<Result<(), CfnError>>,
    update_results: VecDeque<Result<(), CfnError>>,
    delete_results: VecDeque<Result<(), CfnError>>,
    create_change_set_results: VecDeque<Result<(), CfnError>>,
    list_change_sets_results: VecDeque<Result<Vec<ChangeSetSummary>, CfnError>>,
    execute_change_set_results: VecDeque<Result<(), CfnError>>,
    event_batches: VecDeque<Result<Vec<StackEvent>, CfnError>>,
    last_event_batch: Option<Result<Vec<StackEvent>, CfnError>>,
    calls: Vec<RecordedCall>,
}

#[derive(Default)]
pub struct FakeStackBackend {
    inner: Mutex<Inner>,
}

impl FakeStackBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(stack_name: &str) -> CfnError {
        CfnError::Api {
            code: "ValidationError".into(),
            message: format!("Stack with id {stack_name} does not exist"),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // SCRIPTING
    // ═══════════════════════════════════════════════════════════════

    pub fn push_describe(&self, result: Result<StackDescription, CfnError>) {
        self.lock().describe_results.push_back(result);
    }

    pub fn push_create(&self, result: Result<(), CfnError>) {
        self.lock().create_results.push_back(result);
    }

    pub fn push_update(&self, result: Result<(), CfnError>) {
        self.lock().update_results.push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), CfnError>) {
        self.lock().delete_results.push_back(result);
    }

    pub fn push_create_change_set(&self, result: Result<(), CfnError>) {
        self.lock().create_change_set_results.push_back(result);
    }

    pub fn push_list_change_sets(&self, result: Result<Vec<ChangeSetSummary>, CfnError>) {
        self.lock().list_change_sets_results.push_back(result);
    }

    pub fn push_execute_change_set(&self, result: Result<(), CfnError>) {
        self.lock().execute_change_set_results.push_back(result);
    }

    /// Queue one describe-events response. After the queue drains, the last
    /// batch keeps repeating so a poller can reach its terminal event.
    pub fn push_event_batch(&self, result: Result<Vec<StackEvent>, CfnError>) {
        self.lock().event_batches.push_back(result);
    }

    /// Everything the backend was asked to do, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only happens after a panicking test; propagate.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: RecordedCall) {
        self.lock().calls.push(call);
    }
}

impl StackBackend for FakeStackBackend {
    async fn describe_stack(&self, stack_name: &str) -> Result<StackDescription, CfnError> {
        self.record(RecordedCall::DescribeStack(stack_name.to_string()));
        let scripted = self.lock().describe_results.pop_front();
        scripted.unwrap_or_else(|| Err(Self::not_found(stack_name)))
    }

    async fn create_stack(&self, spec: &StackSpec) -> Result<(), CfnError> {
        self.record(RecordedCall::CreateStack(spec.stack_name.clone()));
        let scripted = self.lock().create_results.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn update_stack(&self, spec: &StackSpec) -> Result<(), CfnError> {
        self.record(RecordedCall::UpdateStack(spec.stack_name.clone()));
        let scripted = self.lock().update_results.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), CfnError> {
        self.record(RecordedCall::DeleteStack(stack_name.to_string()));
        let scripted = self.lock().delete_results.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn create_change_set(
        &self,
        spec: &StackSpec,
        _change_set_name: &str,
        change_set_type: ChangeSetType,
    ) -> Result<(), CfnError> {
        self.record(RecordedCall::CreateChangeSet {
            stack_name: spec.stack_name.clone(),
            change_set_type,
        });
        let scripted = self.lock().create_change_set_results.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn list_change_sets(&self, stack_name: &str) -> Result<Vec<ChangeSetSummary>, CfnError> {
        self.record(RecordedCall::ListChangeSets(stack_name.to_string()));
        let scripted = self.lock().list_change_sets_results.pop_front();
        scripted.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn execute_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), CfnError> {
        self.record(RecordedCall::ExecuteChangeSet {
            stack_name: stack_name.to_string(),
            change_set_name: change_set_name.to_string(),
        });
        let scripted = self.lock().execute_change_set_results.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn describe_stack_events(&self, stack_name: &str) -> Result<Vec<StackEvent>, CfnError> {
        self.record(RecordedCall::DescribeStackEvents(stack_name.to_string()));
        let mut inner = self.lock();
        match inner.event_batches.pop_front() {
            Some(batch) => {
                inner.last_event_batch = Some(batch.clone());
                batch
            }
            None => match &inner.last_event_batch {
                Some(batch) => batch.clone(),
                None => Err(Self::not_found(stack_name)),
            },
        }
    }
}
