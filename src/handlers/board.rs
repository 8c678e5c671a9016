use std::sync::Arc;

use actix_web::{web, HttpResponse, Result};
use validator::Validate;

use crate::board::{
    DragDropAdapter, DropTarget, FailurePolicy, MutationCoordinator, NoticeQueue,
};
use crate::client::TaskApi;
use crate::models::api::{
    ApiResponse, DragStartRequest, DropRequest, MutationResponse, NoticeList, ReloadResponse,
};
use crate::models::board::BoardView;
use crate::models::filter::BoardFilters;
use crate::models::task::{TaskStatus, TaskUpdate};
use crate::utils::errors::ServiceError;

/// The board instance served by the bridge.
pub struct BoardSession {
    adapter: DragDropAdapter,
    notices: Arc<NoticeQueue>,
    backend: &'static str,
}

impl BoardSession {
    pub fn new(api: Arc<dyn TaskApi>, per_page: u32, policy: FailurePolicy, backend: &'static str) -> Self {
        let notices = Arc::new(NoticeQueue::new());
        let coordinator = Arc::new(MutationCoordinator::new(api, notices.clone(), per_page, policy));
        Self {
            adapter: DragDropAdapter::new(coordinator),
            notices,
            backend,
        }
    }

    pub fn coordinator(&self) -> &Arc<MutationCoordinator> {
        self.adapter.coordinator()
    }

    pub fn adapter(&self) -> &DragDropAdapter {
        &self.adapter
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    /// `remote` or `demo`.
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

fn parse_status(raw: u8) -> Result<TaskStatus, ServiceError> {
    TaskStatus::try_from(raw).map_err(ServiceError::ValidationError)
}

/// Get the current board
#[utoipa::path(
    get,
    path = "/api/board",
    tag = "board",
    responses(
        (status = 200, description = "Board retrieved successfully", body = ApiResponse<BoardView>)
    )
)]
pub async fn get_board(session: web::Data<BoardSession>) -> Result<HttpResponse, ServiceError> {
    let board = session.coordinator().view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Board retrieved successfully", board)))
}

/// Replace the active filters and reload every column
#[utoipa::path(
    put,
    path = "/api/board/filters",
    tag = "board",
    request_body = BoardFilters,
    responses(
        (status = 200, description = "Board reloaded", body = ApiResponse<ReloadResponse>),
        (status = 400, description = "Validation error", body = crate::utils::errors::ServiceError)
    )
)]
pub async fn update_filters(
    session: web::Data<BoardSession>,
    filters: web::Json<BoardFilters>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("PUT /api/board/filters");
    let filters = filters.into_inner();
    filters.validate()?;

    let summary = session.coordinator().request_full_reload(filters).await;
    let board = session.coordinator().view().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Board reloaded",
        ReloadResponse { summary, board },
    )))
}

/// Load the next page of a column
#[utoipa::path(
    post,
    path = "/api/board/columns/{status}/near-bottom",
    tag = "board",
    params(
        ("status" = u8, Path, description = "Column status (1, 2 or 3)")
    ),
    responses(
        (status = 200, description = "Page request handled", body = ApiResponse<MutationResponse>),
        (status = 400, description = "Invalid status", body = crate::utils::errors::ServiceError)
    )
)]
pub async fn near_bottom(
    session: web::Data<BoardSession>,
    path: web::Path<u8>,
) -> Result<HttpResponse, ServiceError> {
    let status = parse_status(path.into_inner())?;
    log::debug!("POST /api/board/columns/{}/near-bottom", status);

    let outcome = session.coordinator().request_next_page(status).await;
    let board = session.coordinator().view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Page request handled",
        MutationResponse { outcome, board },
    )))
}

/// Start dragging a card
#[utoipa::path(
    post,
    path = "/api/board/drag/start",
    tag = "drag",
    request_body = DragStartRequest,
    responses(
        (status = 200, description = "Drag started", body = ApiResponse<i32>),
        (status = 404, description = "No card at that position", body = crate::utils::errors::ServiceError)
    )
)]
pub async fn drag_start(
    session: web::Data<BoardSession>,
    req: web::Json<DragStartRequest>,
) -> Result<HttpResponse, ServiceError> {
    let status = parse_status(req.status)?;

    match session.adapter().drag_start(status, req.index).await {
        Some(item) => Ok(HttpResponse::Ok().json(ApiResponse::success("Drag started", item.task_id))),
        None => Err(ServiceError::NotFound(format!(
            "No task at index {} in column {}",
            req.index, status
        ))),
    }
}

/// Drop the dragged card onto a card or a column
#[utoipa::path(
    post,
    path = "/api/board/drag/drop",
    tag = "drag",
    request_body = DropRequest,
    responses(
        (status = 200, description = "Drop handled", body = ApiResponse<MutationResponse>),
        (status = 400, description = "Invalid status", body = crate::utils::errors::ServiceError)
    )
)]
pub async fn drop_card(
    session: web::Data<BoardSession>,
    req: web::Json<DropRequest>,
) -> Result<HttpResponse, ServiceError> {
    let target = match req.into_inner() {
        DropRequest::Task { index } => DropTarget::Task { index },
        DropRequest::Column { status } => DropTarget::Column {
            status: parse_status(status)?,
        },
    };

    let outcome = session.adapter().drop(target).await;
    let board = session.coordinator().view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Drop handled",
        MutationResponse { outcome, board },
    )))
}

/// Abandon the current drag
#[utoipa::path(
    post,
    path = "/api/board/drag/cancel",
    tag = "drag",
    responses(
        (status = 200, description = "Drag cancelled", body = ApiResponse<bool>)
    )
)]
pub async fn cancel_drag(session: web::Data<BoardSession>) -> Result<HttpResponse, ServiceError> {
    session.adapter().cancel().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Drag cancelled", true)))
}

/// Edit task details
#[utoipa::path(
    patch,
    path = "/api/board/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Update handled", body = ApiResponse<MutationResponse>),
        (status = 400, description = "Validation error", body = crate::utils::errors::ServiceError)
    )
)]
pub async fn update_task(
    session: web::Data<BoardSession>,
    path: web::Path<i32>,
    update: web::Json<TaskUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("PATCH /api/board/tasks/{}", task_id);
    let update = update.into_inner();
    update.validate()?;

    let outcome = session.coordinator().request_update(task_id, update).await;
    let board = session.coordinator().view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Update handled",
        MutationResponse { outcome, board },
    )))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/board/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Delete handled", body = ApiResponse<MutationResponse>)
    )
)]
pub async fn delete_task(
    session: web::Data<BoardSession>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("DELETE /api/board/tasks/{}", task_id);

    let outcome = session.coordinator().request_delete(task_id).await;
    let board = session.coordinator().view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Delete handled",
        MutationResponse { outcome, board },
    )))
}

/// Collect pending notifications
#[utoipa::path(
    get,
    path = "/api/board/notifications",
    tag = "board",
    responses(
        (status = 200, description = "Notifications drained", body = ApiResponse<NoticeList>)
    )
)]
pub async fn notifications(session: web::Data<BoardSession>) -> Result<HttpResponse, ServiceError> {
    let notices = session.notices().drain();
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Notifications retrieved",
        NoticeList { notices },
    )))
}

pub fn board_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/board")
            .route("", web::get().to(get_board))
            .route("/filters", web::put().to(update_filters))
            .route("/columns/{status}/near-bottom", web::post().to(near_bottom))
            .route("/drag/start", web::post().to(drag_start))
            .route("/drag/drop", web::post().to(drop_card))
            .route("/drag/cancel", web::post().to(cancel_drag))
            .route("/tasks/{id}", web::patch().to(update_task))
            .route("/tasks/{id}", web::delete().to(delete_task))
            .route("/notifications", web::get().to(notifications)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::client::{MockTaskApi, Operation};
    use crate::models::task::Task;

    fn session(api: &MockTaskApi) -> web::Data<BoardSession> {
        web::Data::new(BoardSession::new(
            Arc::new(api.clone()),
            10,
            FailurePolicy::KeepOptimistic,
            "demo",
        ))
    }

    fn seeded() -> MockTaskApi {
        MockTaskApi::with_tasks(vec![
            Task::new(5, TaskStatus::InProgress, 0, "Collect keys"),
            Task::new(7, TaskStatus::InProgress, 1, "Photograph listing"),
            Task::new(9, TaskStatus::Pending, 0, "Draft contract"),
        ])
    }

    fn ids(board: &Value, column: usize) -> Vec<i64> {
        board["columns"][column]["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn filters_reload_the_board() {
        let api = seeded();
        let app = test::init_service(App::new().app_data(session(&api)).configure(board_config)).await;

        let req = test::TestRequest::put()
            .uri("/api/board/filters")
            .set_json(json!({ "sortOrder": "ASC" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "success");
        assert_eq!(ids(&body["data"]["board"], 1), vec![5, 7]);
        assert_eq!(body["data"]["summary"]["failed"], json!([]));
    }

    #[actix_web::test]
    async fn invalid_filters_are_rejected() {
        let api = seeded();
        let app = test::init_service(App::new().app_data(session(&api)).configure(board_config)).await;

        let req = test::TestRequest::put()
            .uri("/api/board/filters")
            .set_json(json!({ "search": "x".repeat(300) }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(api.calls().is_empty());
    }

    #[actix_web::test]
    async fn drag_and_drop_reorders_column() {
        let api = seeded();
        let data = session(&api);
        data.coordinator().request_full_reload(BoardFilters::default()).await;
        let app = test::init_service(App::new().app_data(data.clone()).configure(board_config)).await;

        let req = test::TestRequest::post()
            .uri("/api/board/drag/start")
            .set_json(json!({ "status": 2, "index": 1 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"], 7);

        let req = test::TestRequest::post()
            .uri("/api/board/drag/drop")
            .set_json(json!({ "target": "task", "index": 0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["outcome"]["result"], "confirmed");
        assert_eq!(ids(&body["data"]["board"], 1), vec![7, 5]);
        assert_eq!(api.calls_of(Operation::UpdateOrder).len(), 1);
    }

    #[actix_web::test]
    async fn failed_drop_surfaces_a_notification() {
        let api = seeded();
        let data = session(&api);
        data.coordinator().request_full_reload(BoardFilters::default()).await;
        api.fail_always(Operation::UpdateTask);
        let app = test::init_service(App::new().app_data(data.clone()).configure(board_config)).await;

        let req = test::TestRequest::post()
            .uri("/api/board/drag/start")
            .set_json(json!({ "status": 1, "index": 0 }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/board/drag/drop")
            .set_json(json!({ "target": "column", "status": 3 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["outcome"]["result"], "failed");
        assert_eq!(body["data"]["outcome"]["rolledBack"], false);
        assert_eq!(ids(&body["data"]["board"], 2), vec![9]);

        let req = test::TestRequest::get().uri("/api/board/notifications").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let notices = body["data"]["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["level"], "error");

        let req = test::TestRequest::get().uri("/api/board/notifications").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["notices"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn drag_start_on_empty_slot_is_not_found() {
        let api = seeded();
        let app = test::init_service(App::new().app_data(session(&api)).configure(board_config)).await;

        let req = test::TestRequest::post()
            .uri("/api/board/drag/start")
            .set_json(json!({ "status": 3, "index": 0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unknown_column_is_a_bad_request() {
        let api = seeded();
        let app = test::init_service(App::new().app_data(session(&api)).configure(board_config)).await;

        let req = test::TestRequest::post()
            .uri("/api/board/columns/4/near-bottom")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn delete_reloads_board() {
        let api = seeded();
        let data = session(&api);
        data.coordinator().request_full_reload(BoardFilters::default()).await;
        let app = test::init_service(App::new().app_data(data.clone()).configure(board_config)).await;

        let req = test::TestRequest::delete().uri("/api/board/tasks/9").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["outcome"]["result"], "confirmed");
        assert!(ids(&body["data"]["board"], 0).is_empty());
    }
}
