use std::{net::SocketAddr, path::Path as FsPath, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{create_task, delete_task, get_task, list_tasks, update_task, ApiContext};
use shared::{
    domain::{Task, TaskId},
    error::{ApiError, ErrorCode},
    protocol::{task_route_pattern, tasks_route, CreateTaskRequest, UpdateTaskRequest},
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir};
use tracing::{error, info, warn};

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.static_dir.as_deref());

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, static_dir: Option<&FsPath>) -> Router {
    let router = Router::new()
        .route("/healthz", get(healthz))
        .route(&tasks_route(), get(http_list_tasks).post(http_create_task))
        .route(
            &task_route_pattern(),
            get(http_get_task)
                .put(http_update_task)
                .patch(http_update_task)
                .delete(http_delete_task),
        )
        .with_state(state);

    let router = match static_dir {
        Some(dir) if dir.is_dir() => {
            info!(static_dir = %dir.display(), "serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            warn!(static_dir = %dir.display(), "static directory not found; not serving files");
            router
        }
        None => router,
    };

    router
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(CorsLayer::permissive())
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_tasks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = list_tasks(&state.api).await.map_err(error_response)?;
    Ok(Json(tasks))
}

async fn http_create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = create_task(&state.api, req).await.map_err(error_response)?;
    Ok(Json(task))
}

async fn http_get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = get_task(&state.api, &TaskId(task_id))
        .await
        .map_err(error_response)?;
    Ok(Json(task))
}

async fn http_update_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = update_task(&state.api, &TaskId(task_id), req)
        .await
        .map_err(error_response)?;
    Ok(Json(task))
}

async fn http_delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_task(&state.api, &TaskId(task_id))
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %err.message, "internal error while handling request");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
