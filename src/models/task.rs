use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Workflow column a task belongs to. Travels over the wire as `1`, `2` or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskStatus {
    Pending = 1,
    InProgress = 2,
    Completed = 3,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Position of the column on the board, left to right.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for TaskStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TaskStatus::Pending),
            2 => Ok(TaskStatus::InProgress),
            3 => Ok(TaskStatus::Completed),
            other => Err(format!("invalid task status: {}", other)),
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Ranked priority: lower code means more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Normal = 3,
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Normal),
            other => Err(format!("invalid task priority: {}", other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskMember {
    pub user_id: i32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub uuid: Uuid,
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[schema(value_type = u8)]
    pub priority: Priority,
    #[schema(value_type = u8)]
    pub status: TaskStatus,
    pub order: i32,
    pub added_date: DateTime<Utc>,
    #[serde(default)]
    pub task_start_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub task_end_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_count: u32,
    #[serde(default)]
    pub task_members: Vec<TaskMember>,
}

impl Task {
    pub fn new(id: i32, status: TaskStatus, order: i32, title: impl Into<String>) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            title: title.into(),
            instructions: None,
            priority: Priority::Normal,
            status,
            order,
            added_date: Utc::now(),
            task_start_from: None,
            task_end_on: None,
            resource_count: 0,
            task_members: Vec::new(),
        }
    }

    /// Copies every field the update carries onto this record.
    pub fn apply_update(&mut self, update: &TaskUpdate) {
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(ref instructions) = update.instructions {
            self.instructions = Some(instructions.clone());
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(task_end_on) = update.task_end_on {
            self.task_end_on = Some(task_end_on);
        }
        if let Some(ref user_ids) = update.user_ids {
            // Keep known member names for users that stay assigned.
            let previous = std::mem::take(&mut self.task_members);
            self.task_members = user_ids
                .iter()
                .map(|user_id| {
                    previous
                        .iter()
                        .find(|m| m.user_id == *user_id)
                        .cloned()
                        .unwrap_or(TaskMember { user_id: *user_id, name: None })
                })
                .collect();
        }
    }
}

/// Pagination metadata returned alongside every task page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub page_count: u32,
}

impl PageMeta {
    /// Metadata of a column that has not been loaded yet.
    pub fn empty(per_page: u32) -> Self {
        Self {
            page: 0,
            per_page,
            total: 0,
            page_count: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.page_count
    }

    pub fn next_page(&self) -> u32 {
        self.page + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskPage {
    pub data: Vec<Task>,
    pub meta: PageMeta,
}

/// Field edits made from the task detail view. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10000))]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u8>)]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u8>)]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_end_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<i32>>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_travels_as_integer() {
        let json = serde_json::to_value(TaskStatus::InProgress).unwrap();
        assert_eq!(json, serde_json::json!(2));

        let parsed: TaskStatus = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(parsed, TaskStatus::Completed);

        assert!(serde_json::from_value::<TaskStatus>(serde_json::json!(4)).is_err());
    }

    #[test]
    fn task_decodes_from_api_shape() {
        let raw = serde_json::json!({
            "id": 5,
            "uuid": "8f14e45f-ceea-467f-a8b0-1f1b0b6c3f11",
            "title": "Call landlord",
            "instructions": null,
            "priority": 1,
            "status": 2,
            "order": 0,
            "addedDate": "2024-03-01T09:00:00Z",
            "taskEndOn": "2024-03-08T17:00:00Z",
            "resourceCount": 2,
            "taskMembers": [{ "userId": 9, "name": "Dana" }]
        });

        let task: Task = serde_json::from_value(raw).unwrap();
        assert_eq!(task.id, 5);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.task_start_from.is_none());
        assert_eq!(task.resource_count, 2);
        assert_eq!(task.task_members[0].user_id, 9);
    }

    #[test]
    fn update_only_serializes_present_fields() {
        let body = serde_json::to_value(TaskUpdate::status(TaskStatus::Completed)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": 3 }));
    }

    #[test]
    fn apply_update_keeps_known_member_names() {
        let mut task = Task::new(1, TaskStatus::Pending, 0, "Inspect unit");
        task.task_members = vec![TaskMember { user_id: 4, name: Some("Ari".into()) }];

        task.apply_update(&TaskUpdate {
            title: Some("Inspect unit 4B".into()),
            priority: Some(Priority::Medium),
            user_ids: Some(vec![4, 7]),
            ..TaskUpdate::default()
        });

        assert_eq!(task.title, "Inspect unit 4B");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.task_members[0].name.as_deref(), Some("Ari"));
        assert_eq!(task.task_members[1], TaskMember { user_id: 7, name: None });
    }

    #[test]
    fn page_meta_tracks_remaining_pages() {
        let meta = PageMeta { page: 1, per_page: 10, total: 25, page_count: 3 };
        assert!(meta.has_more());
        assert_eq!(meta.next_page(), 2);
        assert!(!PageMeta::empty(10).has_more());
    }
}
