use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::board::coordinator::{MutationOutcome, ReloadSummary};
use crate::board::notify::Notice;
use crate::models::board::BoardView;

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DragStartRequest {
    /// Column the dragged card is rendered in (1, 2 or 3).
    pub status: u8,
    /// Index of the card within the rendered column.
    pub index: usize,
}

/// Where the dragged card was released.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum DropRequest {
    /// Released over another card of the same column.
    Task { index: usize },
    /// Released over a column container.
    Column { status: u8 },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MutationResponse {
    pub outcome: MutationOutcome,
    pub board: BoardView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoticeList {
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    pub summary: ReloadSummary,
    pub board: BoardView,
}
