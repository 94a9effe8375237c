//! UI/backend events and error modeling for the task list controller.

use shared::domain::{Task, TaskId};

/// One terminal outcome per backend command.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    TasksLoaded(Vec<Task>),
    TaskCreated(Task),
    CompletionToggled(Task),
    TaskRenamed(Task),
    TaskDeleted(TaskId),
    Failed(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadTasks,
    CreateTask,
    ToggleComplete,
    SaveEdit,
    DeleteTask,
}

impl UiErrorContext {
    pub fn describe(self) -> &'static str {
        match self {
            UiErrorContext::BackendStartup => "starting backend worker",
            UiErrorContext::LoadTasks => "loading tasks",
            UiErrorContext::CreateTask => "creating task",
            UiErrorContext::ToggleComplete => "updating task",
            UiErrorContext::SaveEdit => "saving task title",
            UiErrorContext::DeleteTask => "deleting task",
        }
    }
}

/// A failed remote operation. Transport, status and decode failures are not distinguished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn from_error(context: UiErrorContext, err: &anyhow::Error) -> Self {
        Self::from_message(context, format!("{err:#}"))
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
