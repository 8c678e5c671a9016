//! Remote Task API seam.
//!
//! The board never talks to the network directly; it goes through [`TaskApi`]
//! so the HTTP client can be swapped for the in-memory mock in tests and in
//! demo mode.

pub mod http;
pub mod mock;

use async_trait::async_trait;

use crate::models::filter::TaskQuery;
use crate::models::task::{TaskPage, TaskUpdate};
use crate::utils::errors::ApiResult;

pub use http::HttpTaskApi;
pub use mock::{ApiCall, MockTaskApi, Operation};

#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET /task` for one column page.
    async fn list_tasks(&self, query: &TaskQuery) -> ApiResult<TaskPage>;

    /// `PATCH /task/updateOrder/{id}`
    async fn update_order(&self, task_id: i32, order: i32) -> ApiResult<()>;

    /// `PATCH /task/update/{id}`
    async fn update_task(&self, task_id: i32, update: &TaskUpdate) -> ApiResult<()>;

    /// `DELETE /task/delete/{id}`
    async fn delete_task(&self, task_id: i32) -> ApiResult<()>;
}
