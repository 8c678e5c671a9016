use serde::Serialize;
use utoipa::ToSchema;

use crate::models::task::{PageMeta, Task, TaskStatus};

/// Render-ready state of one column.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    #[schema(value_type = u8)]
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
    pub meta: PageMeta,
    pub is_loading: bool,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    pub fn column(&self, status: TaskStatus) -> &ColumnView {
        &self.columns[status.index()]
    }

    pub fn task_ids(&self, status: TaskStatus) -> Vec<i32> {
        self.column(status).tasks.iter().map(|t| t.id).collect()
    }
}
