use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Task, TaskId},
    error::{ApiError, ApiException},
    protocol::{CreateTaskRequest, UpdateTaskRequest, TASKS_PATH},
};
use tracing::debug;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote task collection. Every call resolves to exactly one value or one error.
#[async_trait]
pub trait TaskCollection: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>>;
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task>;
    async fn update_task(&self, task_id: &TaskId, request: &UpdateTaskRequest) -> Result<Task>;
    async fn delete_task(&self, task_id: &TaskId) -> Result<()>;
}

pub struct HttpTaskCollection {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTaskCollection {
    pub fn new(server_url: &str) -> Result<Self> {
        let base_url = Url::parse(server_url.trim())
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("server url '{server_url}' cannot be used as a base"));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn collection_url(&self) -> Result<Url> {
        self.endpoint(&TASKS_PATH)
    }

    fn item_url(&self, task_id: &TaskId) -> Result<Url> {
        self.endpoint(&[TASKS_PATH[0], TASKS_PATH[1], task_id.as_str()])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("server url cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl TaskCollection for HttpTaskCollection {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let url = self.collection_url()?;
        debug!(%url, "listing tasks");
        let response = self.http.get(url).timeout(self.timeout).send().await;
        let tasks: Vec<Task> = decode(response, "list tasks").await?;
        Ok(tasks)
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        let url = self.collection_url()?;
        debug!(%url, "creating task");
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await;
        decode(response, "create task").await
    }

    async fn update_task(&self, task_id: &TaskId, request: &UpdateTaskRequest) -> Result<Task> {
        let url = self.item_url(task_id)?;
        debug!(%url, "updating task");
        let response = self
            .http
            .put(url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await;
        decode(response, &format!("update task {task_id}")).await
    }

    async fn delete_task(&self, task_id: &TaskId) -> Result<()> {
        let url = self.item_url(task_id)?;
        debug!(%url, "deleting task");
        let response = self.http.delete(url).timeout(self.timeout).send().await;
        check_status(response, &format!("delete task {task_id}")).await?;
        Ok(())
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Result<Response>,
    operation: &str,
) -> Result<T> {
    let body = check_status(response, operation)
        .await?
        .json::<T>()
        .await
        .with_context(|| format!("failed to {operation}: malformed response body"))?;
    Ok(body)
}

/// Non-success responses become an [`ApiException`] when the body carries an
/// [`ApiError`], otherwise a plain status error.
async fn check_status(response: reqwest::Result<Response>, operation: &str) -> Result<Response> {
    let response = response.with_context(|| format!("failed to {operation}"))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let err = match response.json::<ApiError>().await {
        Ok(body) => anyhow::Error::new(ApiException::from(body)),
        Err(_) => anyhow!("server responded with {status}"),
    };
    Err(err.context(format!("failed to {operation}")))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
