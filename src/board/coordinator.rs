//! Mutation Coordinator: optimistic local changes paired with one remote call.
//!
//! Every operation follows the same shape. The store is locked, mutated and
//! released before the remote call is issued, so the new state is visible to
//! readers while the request is in flight and no lock is held across an
//! `.await`. Remote failures never escape: they become a [`Notice`] and a
//! [`MutationOutcome::Failed`].

use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::board::notify::{Notice, Notifier};
use crate::board::store::{BoardAction, ColumnStore, Snapshot};
use crate::client::TaskApi;
use crate::models::board::BoardView;
use crate::models::filter::{BoardFilters, TaskQuery};
use crate::models::task::{TaskStatus, TaskUpdate};

/// What happens to the optimistic state when the remote call is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the board as the user arranged it.
    #[default]
    KeepOptimistic,
    /// Put the touched columns back the way they were.
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum MutationOutcome {
    /// Nothing to do: same position, same column, stale index or no more pages.
    Skipped,
    Confirmed,
    Failed {
        #[serde(rename = "rolledBack")]
        rolled_back: bool,
    },
}

/// Result of reloading all three columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReloadSummary {
    #[schema(value_type = Vec<u8>)]
    pub refreshed: Vec<TaskStatus>,
    #[schema(value_type = Vec<u8>)]
    pub failed: Vec<TaskStatus>,
    /// A newer reload started before this one finished; nothing was applied.
    pub superseded: bool,
}

pub struct MutationCoordinator {
    store: RwLock<ColumnStore>,
    api: Arc<dyn TaskApi>,
    notifier: Arc<dyn Notifier>,
    policy: FailurePolicy,
    filters: RwLock<BoardFilters>,
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn TaskApi>,
        notifier: Arc<dyn Notifier>,
        per_page: u32,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            store: RwLock::new(ColumnStore::new(per_page)),
            api,
            notifier,
            policy,
            filters: RwLock::new(BoardFilters::default()),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub async fn view(&self) -> BoardView {
        self.store.read().await.view()
    }

    pub async fn filters(&self) -> BoardFilters {
        self.filters.read().await.clone()
    }

    /// Id of the task currently rendered at `index` in `status`.
    pub async fn task_id_at(&self, status: TaskStatus, index: usize) -> Option<i32> {
        self.store.read().await.task_at(status, index).map(|t| t.id)
    }

    /// Moves the task at `from_index` to `to_index` and sends
    /// `{ order: from_index }` for it.
    pub async fn request_reorder(&self, status: TaskStatus, from_index: usize, to_index: usize) -> MutationOutcome {
        self.reorder_checked(status, from_index, to_index, None).await
    }

    /// Like [`request_reorder`](Self::request_reorder), but skipped unless the
    /// task at `from_index` is still `expected`.
    pub(crate) async fn reorder_checked(
        &self,
        status: TaskStatus,
        from_index: usize,
        to_index: usize,
        expected: Option<i32>,
    ) -> MutationOutcome {
        let (task_id, order, snapshot) = {
            let mut store = self.store.write().await;
            let Some(task_id) = store.task_at(status, from_index).map(|t| t.id) else {
                log::debug!("Reorder skipped: no task at {} in column {}", from_index, status);
                return MutationOutcome::Skipped;
            };
            if expected.is_some_and(|id| id != task_id) {
                log::debug!("Reorder skipped: index {} in column {} no longer holds task {:?}", from_index, status, expected);
                return MutationOutcome::Skipped;
            }
            if from_index == to_index {
                return MutationOutcome::Skipped;
            }
            let Some(order) = order_payload(from_index) else {
                log::warn!("Reorder skipped: index {} in column {} does not fit an order value", from_index, status);
                return MutationOutcome::Skipped;
            };
            let action = BoardAction::Reorder {
                status,
                from_index,
                to_index,
            };
            let Some(snapshot) = store.apply(&action) else {
                log::debug!("Reorder skipped: target {} out of range in column {}", to_index, status);
                return MutationOutcome::Skipped;
            };
            (task_id, order, snapshot)
        };

        log::info!(
            "Task {} reordered in column {}: {} -> {}",
            task_id,
            status,
            from_index,
            to_index
        );

        match self.api.update_order(task_id, order).await {
            Ok(()) => MutationOutcome::Confirmed,
            Err(e) => {
                log::warn!("Order update for task {} rejected: {}", task_id, e);
                self.reject(snapshot, "Failed to update task order").await
            }
        }
    }

    /// Moves the task at `index` of `source` into `target` and sends its new
    /// status.
    pub async fn request_column_change(&self, source: TaskStatus, index: usize, target: TaskStatus) -> MutationOutcome {
        self.column_change_checked(source, index, target, None).await
    }

    /// Like [`request_column_change`](Self::request_column_change), but
    /// skipped unless the task at `index` is still `expected`.
    pub(crate) async fn column_change_checked(
        &self,
        source: TaskStatus,
        index: usize,
        target: TaskStatus,
        expected: Option<i32>,
    ) -> MutationOutcome {
        let (task_id, snapshot) = {
            let mut store = self.store.write().await;
            let Some(task) = store.task_at(source, index) else {
                log::debug!("Column change skipped: no task at {} in column {}", index, source);
                return MutationOutcome::Skipped;
            };
            if expected.is_some_and(|id| id != task.id) {
                log::debug!("Column change skipped: index {} in column {} no longer holds task {:?}", index, source, expected);
                return MutationOutcome::Skipped;
            }
            if task.status == target {
                return MutationOutcome::Skipped;
            }
            let task_id = task.id;
            let action = BoardAction::MoveToColumn {
                task_id,
                from: task.status,
                to: target,
            };
            let Some(snapshot) = store.apply(&action) else {
                return MutationOutcome::Skipped;
            };
            (task_id, snapshot)
        };

        log::info!("Task {} moved from column {} to {}", task_id, source, target);

        match self.api.update_task(task_id, &TaskUpdate::status(target)).await {
            Ok(()) => MutationOutcome::Confirmed,
            Err(e) => {
                log::warn!("Status update for task {} rejected: {}", task_id, e);
                self.reject(snapshot, "Failed to update task status").await
            }
        }
    }

    /// Loads the next page of one column. Skipped when the column has no more
    /// pages or a page request for it is already in flight. A page that lands
    /// after a full reload started is dropped.
    pub async fn request_next_page(&self, status: TaskStatus) -> MutationOutcome {
        let (query, epoch) = {
            let mut store = self.store.write().await;
            let column = store.column(status);
            if !column.has_more() || column.is_loading {
                return MutationOutcome::Skipped;
            }
            let (page, per_page) = (column.meta.next_page(), column.meta.per_page.max(1));
            store.set_loading(status, true);
            let query = TaskQuery::for_column(status, page, per_page, &*self.filters.read().await);
            (query, store.epoch())
        };

        let result = self.api.list_tasks(&query).await;

        let mut store = self.store.write().await;
        if store.epoch() != epoch {
            log::debug!("Column {} page {} dropped: board reloaded while it was loading", status, query.page);
            return MutationOutcome::Skipped;
        }
        store.set_loading(status, false);
        match result {
            Ok(fetched) => {
                let added = store.append_page(status, fetched.data, fetched.meta);
                log::info!("Column {} page {} loaded: {} tasks", status, query.page, added);
                MutationOutcome::Confirmed
            }
            Err(e) => {
                log::warn!("Column {} page {} failed to load: {}", status, query.page, e);
                MutationOutcome::Failed { rolled_back: false }
            }
        }
    }

    /// Refetches the first page of every column with `filters`. Columns whose
    /// fetch fails keep what they had. A reload overtaken by a newer one
    /// leaves the board to the newer one.
    pub async fn request_full_reload(&self, filters: BoardFilters) -> ReloadSummary {
        let (per_page, epoch) = {
            let mut store = self.store.write().await;
            let epoch = store.begin_reload();
            *self.filters.write().await = filters.clone();
            (store.per_page(), epoch)
        };

        let fetches = TaskStatus::ALL.map(|status| {
            let query = TaskQuery::for_column(status, 1, per_page, &filters);
            let api = Arc::clone(&self.api);
            async move { (status, api.list_tasks(&query).await) }
        });
        let results = join_all(fetches).await;

        let mut summary = ReloadSummary::default();
        let mut store = self.store.write().await;
        if store.epoch() != epoch {
            log::debug!("Reload {} superseded by reload {}", epoch, store.epoch());
            summary.superseded = true;
            return summary;
        }
        for (status, result) in results {
            store.set_loading(status, false);
            match result {
                Ok(page) => {
                    store.replace_column(status, page.data, page.meta);
                    summary.refreshed.push(status);
                }
                Err(e) => {
                    log::warn!("Column {} reload failed, keeping previous tasks: {}", status, e);
                    summary.failed.push(status);
                }
            }
        }

        log::info!(
            "Board reloaded: {} columns refreshed, {} failed",
            summary.refreshed.len(),
            summary.failed.len()
        );
        summary
    }

    /// Sends detail-view edits and patches the local record once the server
    /// accepts them.
    pub async fn request_update(&self, task_id: i32, update: TaskUpdate) -> MutationOutcome {
        if update.is_empty() {
            return MutationOutcome::Skipped;
        }

        match self.api.update_task(task_id, &update).await {
            Ok(()) => {
                let mut store = self.store.write().await;
                if store.apply(&BoardAction::Patch { task_id, update }).is_none() {
                    log::debug!("Task {} updated remotely but is not loaded on the board", task_id);
                }
                MutationOutcome::Confirmed
            }
            Err(e) => {
                log::warn!("Update for task {} rejected: {}", task_id, e);
                self.notifier.notify(Notice::error("Failed to update task"));
                MutationOutcome::Failed { rolled_back: false }
            }
        }
    }

    /// Deletes a task, drops it from the board and reloads with the active
    /// filters.
    pub async fn request_delete(&self, task_id: i32) -> MutationOutcome {
        match self.api.delete_task(task_id).await {
            Ok(()) => {
                self.store.write().await.remove_task(task_id);
                log::info!("Task {} deleted", task_id);
                self.notifier.notify(Notice::info("Task deleted"));
                let filters = self.filters().await;
                self.request_full_reload(filters).await;
                MutationOutcome::Confirmed
            }
            Err(e) => {
                log::warn!("Delete of task {} rejected: {}", task_id, e);
                self.notifier.notify(Notice::error("Failed to delete task"));
                MutationOutcome::Failed { rolled_back: false }
            }
        }
    }

    async fn reject(&self, snapshot: Snapshot, message: &str) -> MutationOutcome {
        let rolled_back = match self.policy {
            FailurePolicy::KeepOptimistic => false,
            FailurePolicy::Rollback => {
                self.store.write().await.restore(snapshot);
                true
            }
        };
        self.notifier.notify(Notice::error(message));
        MutationOutcome::Failed { rolled_back }
    }
}

/// The `order` sent with a reorder, or `None` when the index does not fit.
fn order_payload(from_index: usize) -> Option<i32> {
    i32::try_from(from_index).ok()
}
