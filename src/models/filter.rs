use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::task::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Board,
    Table,
}

/// Query state shared by every column fetch. Replaced wholesale when the
/// filter bar changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardFilters {
    pub project_id: Option<i32>,
    pub user_ids: Vec<i32>,
    #[validate(length(min = 1, max = 64))]
    pub sort_by_field: Option<String>,
    pub sort_order: SortOrder,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub task_type: Option<String>,
    pub view_mode: ViewMode,
}

impl Default for BoardFilters {
    fn default() -> Self {
        Self {
            project_id: None,
            user_ids: Vec::new(),
            sort_by_field: Some("order".to_string()),
            sort_order: SortOrder::Asc,
            search: None,
            task_type: None,
            view_mode: ViewMode::Board,
        }
    }
}

/// Query string of `GET /task`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub status: u8,
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by_field: Option<String>,
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn for_column(status: TaskStatus, page: u32, per_page: u32, filters: &BoardFilters) -> Self {
        let user_ids = if filters.user_ids.is_empty() {
            None
        } else {
            Some(
                filters
                    .user_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            )
        };

        Self {
            status: status.code(),
            page,
            per_page,
            sort_by_field: filters.sort_by_field.clone(),
            sort_order: filters.sort_order,
            project_id: filters.project_id,
            user_ids,
            task_type: filters.task_type.clone(),
            search: filters.search.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_query_carries_filters() {
        let filters = BoardFilters {
            project_id: Some(12),
            user_ids: vec![3, 8],
            search: Some("   ".into()),
            ..BoardFilters::default()
        };

        let query = TaskQuery::for_column(TaskStatus::Completed, 2, 10, &filters);
        assert_eq!(query.status, 3);
        assert_eq!(query.page, 2);
        assert_eq!(query.user_ids.as_deref(), Some("3,8"));
        assert_eq!(query.project_id, Some(12));
        assert!(query.search.is_none());
    }

    #[test]
    fn filters_reject_oversized_search() {
        let filters = BoardFilters {
            search: Some("x".repeat(201)),
            ..BoardFilters::default()
        };
        assert!(filters.validate().is_err());
        assert!(BoardFilters::default().validate().is_ok());
    }

    #[test]
    fn filters_accept_partial_json() {
        let filters: BoardFilters =
            serde_json::from_value(serde_json::json!({ "projectId": 4, "sortOrder": "DESC" })).unwrap();
        assert_eq!(filters.project_id, Some(4));
        assert_eq!(filters.sort_order, SortOrder::Desc);
        assert_eq!(filters.sort_by_field.as_deref(), Some("order"));
    }
}
