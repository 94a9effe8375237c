use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    created: Arc<Mutex<Vec<serde_json::Value>>>,
    updates: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

fn sample_task(id: &str, title: &str, completed: bool) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.to_string(),
        completed,
        created_at: "2024-01-01T00:00:00+00:00".to_string(),
    }
}

async fn handle_list() -> Json<Vec<Task>> {
    Json(vec![
        sample_task("2", "second", false),
        sample_task("1", "first", true),
    ])
}

async fn handle_create(
    State(state): State<ServerState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<Task> {
    let title = payload["title"].as_str().unwrap_or_default().to_string();
    state.created.lock().await.push(payload);
    Json(sample_task("new", &title, false))
}

async fn handle_update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Json<Task> {
    let completed = payload["completed"].as_bool().unwrap_or(false);
    let title = payload["title"].as_str().unwrap_or("unchanged").to_string();
    state.updates.lock().await.push((id.clone(), payload));
    Json(sample_task(&id, &title, completed))
}

async fn handle_delete(State(state): State<ServerState>, Path(id): Path<String>) -> StatusCode {
    state.deleted.lock().await.push(id);
    StatusCode::NO_CONTENT
}

async fn spawn_server(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_task_server() -> Result<(String, ServerState)> {
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/todos", get(handle_list).post(handle_create))
        .route("/api/todos/:id", put(handle_update).delete(handle_delete))
        .with_state(state.clone());
    Ok((spawn_server(app).await?, state))
}

#[test]
fn rejects_unparseable_server_url() {
    assert!(HttpTaskCollection::new("not a url").is_err());
    assert!(HttpTaskCollection::new("mailto:someone@example.com").is_err());
}

#[test]
fn builds_endpoints_under_base_path() {
    let client = HttpTaskCollection::new("http://localhost:3000/prefix/").expect("client");
    assert_eq!(
        client.collection_url().expect("url").as_str(),
        "http://localhost:3000/prefix/api/todos"
    );
    assert_eq!(
        client.item_url(&TaskId::new("a b/c")).expect("url").as_str(),
        "http://localhost:3000/prefix/api/todos/a%20b%2Fc"
    );
}

#[tokio::test]
async fn list_preserves_server_order() {
    let (server_url, _state) = spawn_task_server().await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    let tasks = client.list_tasks().await.expect("list");
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert!(tasks[1].completed);
}

#[tokio::test]
async fn create_posts_title_only() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    let task = client
        .create_task(&CreateTaskRequest::new("buy milk"))
        .await
        .expect("create");
    assert_eq!(task.title, "buy milk");

    let created = state.created.lock().await;
    assert_eq!(created.as_slice(), &[serde_json::json!({ "title": "buy milk" })]);
}

#[tokio::test]
async fn update_sends_sparse_patch_to_item_route() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    let task = client
        .update_task(&TaskId::new("7"), &UpdateTaskRequest::completed(true))
        .await
        .expect("update");
    assert!(task.completed);

    let updates = state.updates.lock().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "7");
    assert_eq!(updates[0].1, serde_json::json!({ "completed": true }));
}

#[tokio::test]
async fn delete_encodes_identifier_segment() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    client
        .delete_task(&TaskId::new("id with space"))
        .await
        .expect("delete");
    assert_eq!(state.deleted.lock().await.as_slice(), &["id with space".to_string()]);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let app = Router::new().route(
        "/api/todos",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    let err = client.list_tasks().await.expect_err("must fail");
    assert!(err.to_string().contains("list tasks"), "unexpected error: {err}");
}

#[tokio::test]
async fn structured_server_error_is_surfaced_as_api_exception() {
    let app = Router::new().route(
        "/api/todos/:id",
        put(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(
                    shared::error::ErrorCode::NotFound,
                    "task not found",
                )),
            )
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    let err = client
        .update_task(&TaskId::new("missing"), &UpdateTaskRequest::completed(true))
        .await
        .expect_err("must fail");
    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.code, shared::error::ErrorCode::NotFound);
    assert_eq!(api.message, "task not found");
    assert!(format!("{err:#}").contains("update task missing"));
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let app = Router::new().route("/api/todos", get(|| async { "not json" }));
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url).expect("client");

    let err = client.list_tasks().await.expect_err("must fail");
    assert!(err.to_string().contains("malformed"), "unexpected error: {err}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let app = Router::new().route(
        "/api/todos",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(Vec::<Task>::new())
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpTaskCollection::new(&server_url)
        .expect("client")
        .with_timeout(Duration::from_millis(100));

    client.list_tasks().await.expect_err("must time out");
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpTaskCollection::new(&format!("http://{addr}")).expect("client");
    client
        .create_task(&CreateTaskRequest::new("lost"))
        .await
        .expect_err("must fail");
}
