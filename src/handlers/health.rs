use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::handlers::BoardSession;
use crate::models::api::ApiResponse;
use crate::models::task::TaskStatus;

pub async fn health_check(session: web::Data<BoardSession>) -> Result<HttpResponse> {
    let board = session.coordinator().view().await;
    let loaded: Vec<usize> = TaskStatus::ALL
        .iter()
        .map(|status| board.column(*status).tasks.len())
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Kanban board bridge is running",
        json!({
            "status": "ok",
            "backend": session.backend(),
            "failurePolicy": session.coordinator().policy(),
            "loaded": {
                "pending": loaded[0],
                "inProgress": loaded[1],
                "completed": loaded[2]
            },
            "pendingNotices": session.notices().len()
        }),
    )))
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
