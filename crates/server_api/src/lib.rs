use shared::{
    domain::{Task, TaskId},
    error::{ApiError, ErrorCode},
    protocol::{CreateTaskRequest, UpdateTaskRequest},
};
use storage::Storage;
use tracing::info;

pub const MAX_TITLE_CHARS: usize = 500;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_tasks(ctx: &ApiContext) -> Result<Vec<Task>, ApiError> {
    ctx.storage.list_tasks().await.map_err(internal)
}

pub async fn get_task(ctx: &ApiContext, task_id: &TaskId) -> Result<Task, ApiError> {
    ctx.storage
        .load_task(task_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(task_id))
}

pub async fn create_task(ctx: &ApiContext, req: CreateTaskRequest) -> Result<Task, ApiError> {
    let title = validate_title(&req.title)?;
    let task = ctx.storage.create_task(&title).await.map_err(internal)?;
    info!(task_id = %task.id, "task created");
    Ok(task)
}

pub async fn update_task(
    ctx: &ApiContext,
    task_id: &TaskId,
    req: UpdateTaskRequest,
) -> Result<Task, ApiError> {
    let title = req.title.as_deref().map(validate_title).transpose()?;
    let task = ctx
        .storage
        .update_task(task_id, title.as_deref(), req.completed)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(task_id))?;
    info!(
        task_id = %task.id,
        title_changed = title.is_some(),
        completed = ?req.completed,
        "task updated"
    );
    Ok(task)
}

pub async fn delete_task(ctx: &ApiContext, task_id: &TaskId) -> Result<(), ApiError> {
    let removed = ctx.storage.delete_task(task_id).await.map_err(internal)?;
    if !removed {
        return Err(not_found(task_id));
    }
    info!(%task_id, "task deleted");
    Ok(())
}

fn validate_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("title exceeds {MAX_TITLE_CHARS} characters"),
        ));
    }
    Ok(title.to_string())
}

fn not_found(task_id: &TaskId) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("task {task_id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
