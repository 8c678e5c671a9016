//! Drag-and-Drop Adapter: turns drag gestures into coordinator intents.
//!
//! A drag captures the card's column, index and task id. On drop the index is
//! checked again under the store lock; if the list moved underneath the drag
//! (page load, reload, another move) the drop is ignored.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::board::coordinator::{MutationCoordinator, MutationOutcome};
use crate::models::task::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragItem {
    pub status: TaskStatus,
    pub index: usize,
    pub task_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Another card in the dragged card's column.
    Task { index: usize },
    /// A column container.
    Column { status: TaskStatus },
}

pub struct DragDropAdapter {
    coordinator: Arc<MutationCoordinator>,
    dragging: Mutex<Option<DragItem>>,
}

impl DragDropAdapter {
    pub fn new(coordinator: Arc<MutationCoordinator>) -> Self {
        Self {
            coordinator,
            dragging: Mutex::new(None),
        }
    }

    pub fn coordinator(&self) -> &Arc<MutationCoordinator> {
        &self.coordinator
    }

    /// Starts dragging the card at `index`. Returns `None` when there is no
    /// card there; any previous drag is abandoned either way.
    pub async fn drag_start(&self, status: TaskStatus, index: usize) -> Option<DragItem> {
        let item = self
            .coordinator
            .task_id_at(status, index)
            .await
            .map(|task_id| DragItem { status, index, task_id });

        *self.dragging.lock().await = item;
        item
    }

    pub async fn current(&self) -> Option<DragItem> {
        *self.dragging.lock().await
    }

    pub async fn cancel(&self) {
        self.dragging.lock().await.take();
    }

    pub async fn drop(&self, target: DropTarget) -> MutationOutcome {
        let Some(item) = self.dragging.lock().await.take() else {
            log::debug!("Drop ignored: nothing is being dragged");
            return MutationOutcome::Skipped;
        };

        match target {
            DropTarget::Task { index } => {
                self.coordinator
                    .reorder_checked(item.status, item.index, index, Some(item.task_id))
                    .await
            }
            DropTarget::Column { status } => {
                self.coordinator
                    .column_change_checked(item.status, item.index, status, Some(item.task_id))
                    .await
            }
        }
    }
}
