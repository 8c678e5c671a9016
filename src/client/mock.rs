//! In-memory Task API backed by a plain task list.
//!
//! Used by the test suites and by the binary when no remote backend is
//! configured. Calls are recorded, failures can be scripted per operation and
//! responses can be held open until the caller releases them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::TaskApi;
use crate::models::filter::{SortOrder, TaskQuery};
use crate::models::task::{PageMeta, Task, TaskPage, TaskStatus, TaskUpdate};
use crate::utils::errors::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTasks,
    UpdateOrder,
    UpdateTask,
    DeleteTask,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListTasks { status: TaskStatus, page: u32 },
    UpdateOrder { task_id: i32, order: i32 },
    UpdateTask { task_id: i32, update: TaskUpdate },
    DeleteTask { task_id: i32 },
}

impl ApiCall {
    pub fn operation(&self) -> Operation {
        match self {
            ApiCall::ListTasks { .. } => Operation::ListTasks,
            ApiCall::UpdateOrder { .. } => Operation::UpdateOrder,
            ApiCall::UpdateTask { .. } => Operation::UpdateTask,
            ApiCall::DeleteTask { .. } => Operation::DeleteTask,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Times(usize),
    Always,
}

#[derive(Default)]
struct MockState {
    tasks: Vec<Task>,
    calls: Vec<ApiCall>,
    failures: HashMap<Operation, Failure>,
    failing_columns: HashSet<TaskStatus>,
    holds: HashMap<Operation, Arc<Notify>>,
}

impl MockState {
    fn take_failure(&mut self, op: Operation) -> bool {
        match self.failures.get(&op).copied() {
            Some(Failure::Always) => true,
            Some(Failure::Times(n)) => {
                if n <= 1 {
                    self.failures.remove(&op);
                } else {
                    self.failures.insert(op, Failure::Times(n - 1));
                }
                true
            }
            None => false,
        }
    }

    fn task_mut(&mut self, task_id: i32) -> ApiResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(ApiError::NotFound(task_id))
    }
}

#[derive(Clone, Default)]
pub struct MockTaskApi {
    state: Arc<Mutex<MockState>>,
}

impl MockTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = Self::new();
        api.state().tasks = tasks;
        api
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn calls_of(&self, op: Operation) -> Vec<ApiCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Fails the next `times` calls of `op`.
    pub fn fail_next(&self, op: Operation, times: usize) {
        if times > 0 {
            self.state().failures.insert(op, Failure::Times(times));
        }
    }

    pub fn fail_always(&self, op: Operation) {
        self.state().failures.insert(op, Failure::Always);
    }

    /// Fails every list request for one column.
    pub fn fail_column(&self, status: TaskStatus) {
        self.state().failing_columns.insert(status);
    }

    pub fn recover(&self) {
        let mut state = self.state();
        state.failures.clear();
        state.failing_columns.clear();
    }

    /// Holds every call of `op` open until the returned handle is notified.
    pub fn hold(&self, op: Operation) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().holds.insert(op, gate.clone());
        gate
    }

    pub fn release(&self, op: Operation) {
        if let Some(gate) = self.state().holds.remove(&op) {
            gate.notify_waiters();
            gate.notify_one();
        }
    }

    /// Stops holding new calls of `op`. Calls already waiting stay held until
    /// the handle returned by [`hold`](Self::hold) is notified.
    pub fn stop_holding(&self, op: Operation) {
        self.state().holds.remove(&op);
    }

    /// Records the call and returns the gate to wait on, if any.
    fn enter(&self, call: ApiCall) -> Option<Arc<Notify>> {
        let op = call.operation();
        let mut state = self.state();
        state.calls.push(call);
        state.holds.get(&op).cloned()
    }

    async fn wait(gate: Option<Arc<Notify>>) {
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn injected(op: Operation) -> ApiError {
        ApiError::Unavailable(format!("injected {:?} failure", op))
    }
}

#[async_trait]
impl TaskApi for MockTaskApi {
    async fn list_tasks(&self, query: &TaskQuery) -> ApiResult<TaskPage> {
        let status = TaskStatus::try_from(query.status).map_err(ApiError::Unavailable)?;
        let gate = self.enter(ApiCall::ListTasks { status, page: query.page });
        Self::wait(gate).await;

        let mut state = self.state();
        if state.failing_columns.contains(&status) || state.take_failure(Operation::ListTasks) {
            return Err(Self::injected(Operation::ListTasks));
        }

        let search = query.search.as_deref().map(str::to_lowercase);
        let mut matching: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .filter(|t| {
                search
                    .as_ref()
                    .map_or(true, |s| t.title.to_lowercase().contains(s))
            })
            .cloned()
            .collect();
        matching.sort_by_key(|t| (t.order, t.id));
        if query.sort_order == SortOrder::Desc {
            matching.reverse();
        }

        let per_page = query.per_page.max(1);
        let total = matching.len() as u32;
        let page_count = (total + per_page - 1) / per_page;
        let skip = (query.page.saturating_sub(1) * per_page) as usize;
        let data = matching.into_iter().skip(skip).take(per_page as usize).collect();

        Ok(TaskPage {
            data,
            meta: PageMeta {
                page: query.page,
                per_page,
                total,
                page_count,
            },
        })
    }

    async fn update_order(&self, task_id: i32, order: i32) -> ApiResult<()> {
        let gate = self.enter(ApiCall::UpdateOrder { task_id, order });
        Self::wait(gate).await;

        let mut state = self.state();
        if state.take_failure(Operation::UpdateOrder) {
            return Err(Self::injected(Operation::UpdateOrder));
        }
        state.task_mut(task_id)?.order = order;
        Ok(())
    }

    async fn update_task(&self, task_id: i32, update: &TaskUpdate) -> ApiResult<()> {
        let gate = self.enter(ApiCall::UpdateTask {
            task_id,
            update: update.clone(),
        });
        Self::wait(gate).await;

        let mut state = self.state();
        if state.take_failure(Operation::UpdateTask) {
            return Err(Self::injected(Operation::UpdateTask));
        }
        state.task_mut(task_id)?.apply_update(update);
        Ok(())
    }

    async fn delete_task(&self, task_id: i32) -> ApiResult<()> {
        let gate = self.enter(ApiCall::DeleteTask { task_id });
        Self::wait(gate).await;

        let mut state = self.state();
        if state.take_failure(Operation::DeleteTask) {
            return Err(Self::injected(Operation::DeleteTask));
        }
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != task_id);
        if state.tasks.len() == before {
            return Err(ApiError::NotFound(task_id));
        }
        Ok(())
    }
}
