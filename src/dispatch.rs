//! Action dispatch: decide and execute exactly one stack action.
//!
//! Priority order: delete, then the changeset pair, then create-or-update
//! driven by the resolved remote state. Errors returned from here are for
//! the caller to log — polling is the true arbiter of success — with one
//! exception: a changeset count mismatch aborts the invocation.

use crate::backend::StackBackend;
use crate::error::CfnError;
use crate::resolve::RemoteStackStatus;
use crate::retry::Retrier;
use crate::types::{ChangeSetType, StackSpec};
use chrono::Utc;
use tracing::{info, warn};

/// Changeset names carry a timestamp suffix so repeated creates stay unique.
const CHANGE_SET_NAME_PREFIX: &str = "concourse-";
/// Description attached to every changeset this resource stages.
pub const CHANGE_SET_DESCRIPTION: &str = "Changeset created by concourse";

/// Execute the one action the spec's flags and the remote state call for.
pub async fn dispatch<B: StackBackend>(
    backend: &B,
    retrier: &Retrier,
    spec: &StackSpec,
    remote: &RemoteStackStatus,
) -> Result<(), CfnError> {
    if spec.delete {
        info!(stack = %spec.stack_name, "deleting stack");
        return retrier
            .execute(|| backend.delete_stack(&spec.stack_name))
            .await;
    }

    if spec.changeset_create || spec.changeset_execute {
        if spec.changeset_create {
            let result = create_change_set(backend, retrier, spec, remote).await;
            if let Err(err) = result {
                // Execution may still be requested; keep going and let the
                // caller see the later result, matching the original flow.
                if spec.changeset_execute {
                    warn!(stack = %spec.stack_name, error = %err, "could not create changeset");
                } else {
                    return Err(err);
                }
            }
        }
        if spec.changeset_execute {
            execute_change_set(backend, retrier, spec).await?;
        }
        return Ok(());
    }

    if !remote.exists {
        info!(stack = %spec.stack_name, "creating stack");
        retrier.execute(|| backend.create_stack(spec)).await
    } else {
        info!(stack = %spec.stack_name, "updating stack");
        match retrier.execute(|| backend.update_stack(spec)).await {
            Err(err) if err.is_no_op_update() => {
                info!(stack = %spec.stack_name, "no updates to be performed");
                Ok(())
            }
            other => other,
        }
    }
}

async fn create_change_set<B: StackBackend>(
    backend: &B,
    retrier: &Retrier,
    spec: &StackSpec,
    remote: &RemoteStackStatus,
) -> Result<(), CfnError> {
    let change_set_type = if remote.exists {
        ChangeSetType::Update
    } else {
        ChangeSetType::Create
    };
    let name = format!(
        "{}{}",
        CHANGE_SET_NAME_PREFIX,
        Utc::now().format("%Y%m%d%H%M%S")
    );
    info!(
        stack = %spec.stack_name,
        changeset = %name,
        kind = change_set_type.as_str(),
        "creating changeset"
    );
    retrier
        .execute(|| backend.create_change_set(spec, &name, change_set_type))
        .await
}

async fn execute_change_set<B: StackBackend>(
    backend: &B,
    retrier: &Retrier,
    spec: &StackSpec,
) -> Result<(), CfnError> {
    let summaries = retrier
        .execute(|| backend.list_change_sets(&spec.stack_name))
        .await?;
    if summaries.len() != 1 {
        return Err(CfnError::ChangeSetCount(summaries.len()));
    }
    info!(stack = %spec.stack_name, changeset = %summaries[0].name, "executing changeset");
    retrier
        .execute(|| backend.execute_change_set(&spec.stack_name, &summaries[0].name))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeStackBackend, RecordedCall};
    use crate::types::ChangeSetSummary;

    fn spec() -> StackSpec {
        StackSpec::new("web").with_template("{}")
    }

    fn existing() -> RemoteStackStatus {
        RemoteStackStatus {
            exists: true,
            last_updated_time: None,
        }
    }

    #[tokio::test]
    async fn test_delete_wins_over_everything() {
        let backend = FakeStackBackend::new();
        let mut spec = spec();
        spec.delete = true;
        spec.changeset_create = true;

        dispatch(&backend, &Retrier::default(), &spec, &existing())
            .await
            .expect("delete");
        assert_eq!(backend.calls(), vec![RecordedCall::DeleteStack("web".into())]);
    }

    #[tokio::test]
    async fn test_absent_stack_is_created() {
        let backend = FakeStackBackend::new();
        dispatch(
            &backend,
            &Retrier::default(),
            &spec(),
            &RemoteStackStatus::absent(),
        )
        .await
        .expect("create");
        assert_eq!(backend.calls(), vec![RecordedCall::CreateStack("web".into())]);
    }

    #[tokio::test]
    async fn test_existing_stack_is_updated() {
        let backend = FakeStackBackend::new();
        dispatch(&backend, &Retrier::default(), &spec(), &existing())
            .await
            .expect("update");
        assert_eq!(backend.calls(), vec![RecordedCall::UpdateStack("web".into())]);
    }

    #[tokio::test]
    async fn test_no_op_update_is_success() {
        let backend = FakeStackBackend::new();
        backend.push_update(Err(CfnError::Api {
            code: "ValidationError".into(),
            message: "No updates are to be performed.".into(),
        }));
        dispatch(&backend, &Retrier::default(), &spec(), &existing())
            .await
            .expect("no-op update is not an error");
    }

    #[tokio::test]
    async fn test_other_update_errors_propagate() {
        let backend = FakeStackBackend::new();
        backend.push_update(Err(CfnError::Api {
            code: "ValidationError".into(),
            message: "Template format error".into(),
        }));
        let err = dispatch(&backend, &Retrier::default(), &spec(), &existing())
            .await
            .expect_err("update failure propagates");
        assert!(!err.is_no_op_update());
    }

    #[tokio::test]
    async fn test_changeset_type_follows_existence() {
        let backend = FakeStackBackend::new();
        let mut spec = spec();
        spec.changeset_create = true;

        dispatch(
            &backend,
            &Retrier::default(),
            &spec,
            &RemoteStackStatus::absent(),
        )
        .await
        .expect("create changeset");
        assert_eq!(
            backend.calls(),
            vec![RecordedCall::CreateChangeSet {
                stack_name: "web".into(),
                change_set_type: ChangeSetType::Create,
            }]
        );

        let backend = FakeStackBackend::new();
        dispatch(&backend, &Retrier::default(), &spec, &existing())
            .await
            .expect("update changeset");
        assert_eq!(
            backend.calls(),
            vec![RecordedCall::CreateChangeSet {
                stack_name: "web".into(),
                change_set_type: ChangeSetType::Update,
            }]
        );
    }

    #[tokio::test]
    async fn test_execute_requires_exactly_one_changeset() {
        let backend = FakeStackBackend::new();
        backend.push_list_change_sets(Ok(vec![
            ChangeSetSummary {
                name: "concourse-20240101000000".into(),
                status: "CREATE_COMPLETE".into(),
            },
            ChangeSetSummary {
                name: "concourse-20240102000000".into(),
                status: "CREATE_COMPLETE".into(),
            },
        ]));
        let mut spec = spec();
        spec.changeset_execute = true;

        let err = dispatch(&backend, &Retrier::default(), &spec, &existing())
            .await
            .expect_err("two changesets must not execute");
        assert_eq!(err, CfnError::ChangeSetCount(2));
        // The execute call must never have been issued.
        assert_eq!(
            backend.calls(),
            vec![RecordedCall::ListChangeSets("web".into())]
        );
    }

    #[tokio::test]
    async fn test_execute_single_changeset() {
        let backend = FakeStackBackend::new();
        backend.push_list_change_sets(Ok(vec![ChangeSetSummary {
            name: "concourse-20240101000000".into(),
            status: "CREATE_COMPLETE".into(),
        }]));
        let mut spec = spec();
        spec.changeset_execute = true;

        dispatch(&backend, &Retrier::default(), &spec, &existing())
            .await
            .expect("execute");
        assert_eq!(
            backend.calls(),
            vec![
                RecordedCall::ListChangeSets("web".into()),
                RecordedCall::ExecuteChangeSet {
                    stack_name: "web".into(),
                    change_set_name: "concourse-20240101000000".into(),
                },
            ]
        );
    }
}
