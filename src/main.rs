use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use kanban_board_sync::board::{FailurePolicy, MutationOutcome, Notice, NoticeLevel, ReloadSummary};
use kanban_board_sync::client::{HttpTaskApi, TaskApi};
use kanban_board_sync::config::AppConfig;
use kanban_board_sync::demo;
use kanban_board_sync::handlers::{self, board_config, health_config, BoardSession};
use kanban_board_sync::models::api::{
    DragStartRequest, DropRequest, ErrorResponse, MutationResponse, NoticeList, ReloadResponse,
};
use kanban_board_sync::models::board::{BoardView, ColumnView};
use kanban_board_sync::models::filter::{BoardFilters, SortOrder, ViewMode};
use kanban_board_sync::models::task::{PageMeta, Task, TaskMember, TaskUpdate};
use kanban_board_sync::utils::errors::ServiceError;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::board::get_board,
        handlers::board::update_filters,
        handlers::board::near_bottom,
        handlers::board::drag_start,
        handlers::board::drop_card,
        handlers::board::cancel_drag,
        handlers::board::update_task,
        handlers::board::delete_task,
        handlers::board::notifications,
    ),
    components(schemas(
        BoardView, ColumnView, Task, TaskMember, PageMeta, TaskUpdate,
        BoardFilters, SortOrder, ViewMode,
        DragStartRequest, DropRequest, MutationResponse, ReloadResponse, NoticeList,
        MutationOutcome, ReloadSummary, FailurePolicy, Notice, NoticeLevel,
        ErrorResponse, ServiceError,
    )),
    tags(
        (name = "board", description = "Board view, filters and infinite scroll"),
        (name = "drag", description = "Drag-and-drop gestures"),
        (name = "tasks", description = "Task detail edits")
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let (api, backend): (Arc<dyn TaskApi>, &'static str) = match config.task_api_url {
        Some(ref url) => {
            let client = HttpTaskApi::from_url(url, config.task_api_token.clone())
                .context("Failed to create Task API client")?;
            log::info!("🔗 Using Task API at {}", client.base_url());
            (Arc::new(client), "remote")
        }
        None => {
            log::warn!("⚠️  TASK_API_URL not set, serving the demo board");
            (Arc::new(demo::demo_api()), "demo")
        }
    };

    let session = web::Data::new(BoardSession::new(
        api,
        config.per_page,
        config.failure_policy,
        backend,
    ));

    let summary = session
        .coordinator()
        .request_full_reload(BoardFilters::default())
        .await;
    if summary.failed.is_empty() {
        log::info!("✅ Initial board load complete");
    } else {
        log::warn!("⚠️  Initial load failed for columns {:?}", summary.failed);
    }

    log::info!("🚀 Starting board bridge on port {}", config.port);
    log::info!("📋 Allowed frontend URLs: {:?}", config.frontend_urls);
    log::info!("🛟 Failure policy: {:?}", config.failure_policy);

    let allowed_origins = config.frontend_urls.clone();
    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                "Authorization",
                "Content-Type",
                "Accept",
                "Origin",
                "X-Requested-With",
            ])
            .supports_credentials();

        // Add allowed origins
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(session.clone())
            .configure(health_config)
            .configure(board_config)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            .route("/", web::get().to(|| async {
                HttpResponse::Ok().json(serde_json::json!({
                    "name": "Kanban Board Sync",
                    "version": env!("CARGO_PKG_VERSION"),
                    "description": "Board synchronization bridge for the Kanban task board"
                }))
            }))
    })
    .bind(("0.0.0.0", config.port))
    .with_context(|| format!("Failed to bind port {}", config.port))?
    .run()
    .await
    .context("Board bridge stopped with an error")
}
