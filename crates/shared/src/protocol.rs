use serde::{Deserialize, Serialize};

/// Path segments of the task collection. Item routes append the task id.
pub const TASKS_PATH: [&str; 2] = ["api", "todos"];

pub fn tasks_route() -> String {
    format!("/{}", TASKS_PATH.join("/"))
}

/// Router pattern for a single task, with the id captured as `id`.
pub fn task_route_pattern() -> String {
    format!("{}/:id", tasks_route())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

impl CreateTaskRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Sparse patch: absent fields are left unchanged by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }
}
