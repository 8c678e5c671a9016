//! Column Store: the board's in-memory, paginated task columns.
//!
//! Pure data. Nothing in here performs I/O; every mutation is synchronous and
//! reports whether it changed anything so the coordinator can decide whether
//! a remote call is needed.

use crate::models::board::{BoardView, ColumnView};
use crate::models::task::{PageMeta, Task, TaskStatus, TaskUpdate};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
    pub meta: PageMeta,
    pub is_loading: bool,
}

impl Column {
    fn empty(status: TaskStatus, per_page: u32) -> Self {
        Self {
            status,
            tasks: Vec::new(),
            meta: PageMeta::empty(per_page),
            is_loading: false,
        }
    }

    pub fn position(&self, task_id: i32) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    pub fn has_more(&self) -> bool {
        self.meta.has_more()
    }

    /// Reassigns the column's existing order values, ascending, in list order.
    /// Ties are broken by bumping the later value, so orders end up strictly
    /// increasing with index.
    fn normalize_order(&mut self) {
        let mut orders: Vec<i32> = self.tasks.iter().map(|t| t.order).collect();
        orders.sort_unstable();
        let mut previous: Option<i32> = None;
        for order in orders.iter_mut() {
            if let Some(prev) = previous.filter(|prev| *order <= *prev) {
                *order = prev.saturating_add(1);
            }
            previous = Some(*order);
        }
        for (task, order) in self.tasks.iter_mut().zip(orders) {
            task.order = order;
        }
    }
}

/// A single optimistic mutation. Every local change made ahead of a remote
/// call goes through [`ColumnStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoardAction {
    Reorder {
        status: TaskStatus,
        from_index: usize,
        to_index: usize,
    },
    MoveToColumn {
        task_id: i32,
        from: TaskStatus,
        to: TaskStatus,
    },
    Patch {
        task_id: i32,
        update: TaskUpdate,
    },
}

/// Column contents captured before an action touched them.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    columns: Vec<(TaskStatus, Vec<Task>, PageMeta)>,
}

impl Snapshot {
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.columns.iter().map(|(status, _, _)| *status).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStore {
    columns: [Column; 3],
    per_page: u32,
    /// Bumped by every full reload. Page results fetched under an older
    /// epoch are discarded.
    epoch: u64,
}

impl ColumnStore {
    pub fn new(per_page: u32) -> Self {
        Self {
            columns: TaskStatus::ALL.map(|status| Column::empty(status, per_page)),
            per_page,
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a new reload epoch and marks every column as loading. Any page
    /// request still in flight belongs to the previous epoch from here on.
    pub fn begin_reload(&mut self) -> u64 {
        self.epoch += 1;
        for column in self.columns.iter_mut() {
            column.is_loading = true;
        }
        self.epoch
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn column(&self, status: TaskStatus) -> &Column {
        &self.columns[status.index()]
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Column {
        &mut self.columns[status.index()]
    }

    pub fn task_at(&self, status: TaskStatus, index: usize) -> Option<&Task> {
        self.column(status).tasks.get(index)
    }

    pub fn find(&self, task_id: i32) -> Option<&Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .find(|t| t.id == task_id)
    }

    /// Column and index currently holding `task_id`.
    pub fn locate(&self, task_id: i32) -> Option<(TaskStatus, usize)> {
        self.columns
            .iter()
            .find_map(|c| c.position(task_id).map(|index| (c.status, index)))
    }

    /// Resets every column. Tasks are partitioned by their own status;
    /// `metas` is indexed by column position.
    pub fn replace_all(&mut self, tasks: Vec<Task>, metas: [PageMeta; 3]) {
        for (column, meta) in self.columns.iter_mut().zip(metas) {
            column.tasks.clear();
            column.meta = meta;
        }
        for task in tasks {
            self.column_mut(task.status).tasks.push(task);
        }
    }

    /// Resets one column, leaving the others untouched.
    pub fn replace_column(&mut self, status: TaskStatus, tasks: Vec<Task>, meta: PageMeta) {
        let column = self.column_mut(status);
        column.tasks = tasks
            .into_iter()
            .map(|mut task| {
                task.status = status;
                task
            })
            .collect();
        column.meta = meta;
    }

    /// Appends a fetched page. Tasks already on the board are skipped so a
    /// task never shows up twice. Returns how many tasks were added.
    pub fn append_page(&mut self, status: TaskStatus, tasks: Vec<Task>, meta: PageMeta) -> usize {
        let mut added = 0;
        for mut task in tasks {
            if let Some((held_by, _)) = self.locate(task.id) {
                log::warn!(
                    "Skipping task {} from column {} page {}: already in column {}",
                    task.id,
                    status,
                    meta.page,
                    held_by
                );
                continue;
            }
            task.status = status;
            self.column_mut(status).tasks.push(task);
            added += 1;
        }
        self.column_mut(status).meta = meta;
        added
    }

    /// Remove-then-insert within one column. Returns false when either index
    /// is out of range, in which case nothing changes.
    pub fn reorder_within_column(&mut self, status: TaskStatus, from_index: usize, to_index: usize) -> bool {
        let column = self.column_mut(status);
        let len = column.tasks.len();
        if from_index >= len || to_index >= len {
            return false;
        }
        if from_index == to_index {
            return true;
        }

        let task = column.tasks.remove(from_index);
        column.tasks.insert(to_index, task);
        column.normalize_order();
        true
    }

    /// Moves a task to the top of another column and updates its status. The
    /// task takes an order just below the column's current top.
    /// Returns false for a same-column move or an unknown task.
    pub fn move_to_column(&mut self, task_id: i32, from: TaskStatus, to: TaskStatus) -> bool {
        if from == to {
            return false;
        }

        let source = self.column_mut(from);
        let Some(index) = source.position(task_id) else {
            return false;
        };
        let mut task = source.tasks.remove(index);
        source.meta.total = source.meta.total.saturating_sub(1);

        task.status = to;
        let target = self.column_mut(to);
        if let Some(top) = target.tasks.first() {
            task.order = top.order.saturating_sub(1);
        }
        target.tasks.insert(0, task);
        target.normalize_order();
        target.meta.total += 1;
        true
    }

    /// Removes a task from whichever column holds it. Idempotent.
    pub fn remove_task(&mut self, task_id: i32) -> Option<Task> {
        let (status, index) = self.locate(task_id)?;
        let column = self.column_mut(status);
        column.meta.total = column.meta.total.saturating_sub(1);
        Some(column.tasks.remove(index))
    }

    pub fn set_loading(&mut self, status: TaskStatus, loading: bool) {
        self.column_mut(status).is_loading = loading;
    }

    /// Applies an action and returns a snapshot of what it touched, or `None`
    /// when the action changed nothing.
    pub fn apply(&mut self, action: &BoardAction) -> Option<Snapshot> {
        match action {
            BoardAction::Reorder {
                status,
                from_index,
                to_index,
            } => {
                if from_index == to_index {
                    return None;
                }
                let snapshot = self.snapshot(&[*status]);
                self.reorder_within_column(*status, *from_index, *to_index)
                    .then_some(snapshot)
            }
            BoardAction::MoveToColumn { task_id, from, to } => {
                let snapshot = self.snapshot(&[*from, *to]);
                self.move_to_column(*task_id, *from, *to).then_some(snapshot)
            }
            BoardAction::Patch { task_id, update } => {
                let (status, index) = self.locate(*task_id)?;
                let target = update.status.unwrap_or(status);
                let snapshot = self.snapshot(&[status, target]);

                self.column_mut(status).tasks[index].apply_update(update);
                if target != status {
                    // apply_update already switched the status field.
                    self.column_mut(status).tasks[index].status = status;
                    self.move_to_column(*task_id, status, target);
                }
                Some(snapshot)
            }
        }
    }

    fn snapshot(&self, statuses: &[TaskStatus]) -> Snapshot {
        let mut columns: Vec<(TaskStatus, Vec<Task>, PageMeta)> = Vec::with_capacity(statuses.len());
        for status in statuses {
            if columns.iter().any(|(s, _, _)| s == status) {
                continue;
            }
            let column = self.column(*status);
            columns.push((*status, column.tasks.clone(), column.meta));
        }
        Snapshot { columns }
    }

    /// Puts captured columns back. Loading flags are left as they are.
    pub fn restore(&mut self, snapshot: Snapshot) {
        for (status, tasks, meta) in snapshot.columns {
            let column = self.column_mut(status);
            column.tasks = tasks;
            column.meta = meta;
        }
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnView {
                    status: c.status,
                    tasks: c.tasks.clone(),
                    meta: c.meta,
                    is_loading: c.is_loading,
                    has_more: c.has_more(),
                })
                .collect(),
        }
    }
}
