use std::sync::Arc;

use kanban_board_sync::board::{
    DragDropAdapter, DropTarget, FailurePolicy, MutationCoordinator, MutationOutcome, NoticeQueue,
};
use kanban_board_sync::client::{ApiCall, MockTaskApi, Operation};
use kanban_board_sync::models::filter::BoardFilters;
use kanban_board_sync::models::task::{PageMeta, Task, TaskStatus};

async fn column_two_board(policy: FailurePolicy) -> (MockTaskApi, Arc<NoticeQueue>, DragDropAdapter) {
    let api = MockTaskApi::with_tasks(vec![
        Task::new(5, TaskStatus::InProgress, 0, "Send brochure"),
        Task::new(7, TaskStatus::InProgress, 1, "Confirm deposit"),
    ]);
    let notices = Arc::new(NoticeQueue::new());
    let coordinator = Arc::new(MutationCoordinator::new(
        Arc::new(api.clone()),
        notices.clone(),
        10,
        policy,
    ));
    coordinator.request_full_reload(BoardFilters::default()).await;
    api.clear_calls();
    (api, notices, DragDropAdapter::new(coordinator))
}

#[tokio::test]
async fn dragging_task_seven_to_the_top_confirms() {
    let (api, notices, adapter) = column_two_board(FailurePolicy::KeepOptimistic).await;
    let view = adapter.coordinator().view().await;
    assert_eq!(
        view.column(TaskStatus::InProgress).meta,
        PageMeta { page: 1, per_page: 10, total: 2, page_count: 1 }
    );

    adapter.drag_start(TaskStatus::InProgress, 1).await.unwrap();
    let outcome = adapter.drop(DropTarget::Task { index: 0 }).await;

    assert_eq!(outcome, MutationOutcome::Confirmed);
    assert_eq!(api.calls(), vec![ApiCall::UpdateOrder { task_id: 7, order: 1 }]);
    assert_eq!(adapter.coordinator().view().await.task_ids(TaskStatus::InProgress), vec![7, 5]);
    assert!(notices.is_empty());
}

#[tokio::test]
async fn dragging_task_seven_to_the_top_survives_rejection() {
    let (api, notices, adapter) = column_two_board(FailurePolicy::KeepOptimistic).await;
    api.fail_always(Operation::UpdateOrder);

    adapter.drag_start(TaskStatus::InProgress, 1).await.unwrap();
    let outcome = adapter.drop(DropTarget::Task { index: 0 }).await;

    assert_eq!(outcome, MutationOutcome::Failed { rolled_back: false });
    assert_eq!(adapter.coordinator().view().await.task_ids(TaskStatus::InProgress), vec![7, 5]);
    assert_eq!(notices.len(), 1);

    // The board stays interactive after the failure.
    api.recover();
    adapter.drag_start(TaskStatus::InProgress, 1).await.unwrap();
    assert_eq!(
        adapter.drop(DropTarget::Column { status: TaskStatus::Completed }).await,
        MutationOutcome::Confirmed
    );
    let view = adapter.coordinator().view().await;
    assert_eq!(view.task_ids(TaskStatus::InProgress), vec![7]);
    assert_eq!(view.task_ids(TaskStatus::Completed), vec![5]);
}

#[tokio::test]
async fn rollback_policy_restores_order_on_rejection() {
    let (api, notices, adapter) = column_two_board(FailurePolicy::Rollback).await;
    api.fail_always(Operation::UpdateOrder);

    adapter.drag_start(TaskStatus::InProgress, 1).await.unwrap();
    let outcome = adapter.drop(DropTarget::Task { index: 0 }).await;

    assert_eq!(outcome, MutationOutcome::Failed { rolled_back: true });
    assert_eq!(adapter.coordinator().view().await.task_ids(TaskStatus::InProgress), vec![5, 7]);
    assert_eq!(notices.len(), 1);
}

#[tokio::test]
async fn rapid_drags_resolve_in_any_order_without_losing_tasks() {
    let api = MockTaskApi::with_tasks(
        (1..=4)
            .map(|id| Task::new(id, TaskStatus::Pending, id - 1, format!("Lead {}", id)))
            .collect(),
    );
    let coordinator = Arc::new(MutationCoordinator::new(
        Arc::new(api.clone()),
        Arc::new(NoticeQueue::new()),
        10,
        FailurePolicy::KeepOptimistic,
    ));
    coordinator.request_full_reload(BoardFilters::default()).await;
    api.hold(Operation::UpdateOrder);

    let first = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.request_reorder(TaskStatus::Pending, 0, 3).await })
    };
    while api.calls_of(Operation::UpdateOrder).is_empty() {
        tokio::task::yield_now().await;
    }

    let second = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.request_column_change(TaskStatus::Pending, 0, TaskStatus::InProgress).await })
    };
    while api.calls_of(Operation::UpdateTask).is_empty() {
        tokio::task::yield_now().await;
    }

    // Both local mutations landed before the reorder was confirmed.
    let view = coordinator.view().await;
    assert_eq!(view.task_ids(TaskStatus::Pending), vec![3, 4, 1]);
    assert_eq!(view.task_ids(TaskStatus::InProgress), vec![2]);

    api.release(Operation::UpdateOrder);
    assert_eq!(second.await.unwrap(), MutationOutcome::Confirmed);
    assert_eq!(first.await.unwrap(), MutationOutcome::Confirmed);

    let view = coordinator.view().await;
    let mut all: Vec<i32> = TaskStatus::ALL.iter().flat_map(|s| view.task_ids(*s)).collect();
    all.sort_unstable();
    assert_eq!(all, vec![1, 2, 3, 4]);
}
