//! Task list view state: the local list, the new-task draft, the single edit
//! session, and how backend events patch them.
//!
//! Handlers never touch the list directly. They return the command to queue,
//! and the list only changes when the matching [`UiEvent`] is applied.

use egui::Key;
use shared::domain::{Task, TaskId};
use tracing::error;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Add,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub task_id: TaskId,
    pub draft: String,
}

#[derive(Debug, Default)]
pub struct TaskListState {
    tasks: Vec<Task>,
    pub new_task_draft: String,
    edit: Option<EditSession>,
    focus_edit_input: bool,
}

impl TaskListState {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn is_editing(&self, task_id: &TaskId) -> bool {
        self.edit
            .as_ref()
            .is_some_and(|session| &session.task_id == task_id)
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut String> {
        self.edit.as_mut().map(|session| &mut session.draft)
    }

    pub fn load(&self) -> BackendCommand {
        BackendCommand::LoadTasks
    }

    pub fn add(&self) -> Option<BackendCommand> {
        let title = self.new_task_draft.trim();
        if title.is_empty() {
            return None;
        }
        Some(BackendCommand::CreateTask {
            title: title.to_string(),
        })
    }

    pub fn toggle_complete(&self, task: &Task) -> BackendCommand {
        BackendCommand::SetCompleted {
            task_id: task.id.clone(),
            completed: !task.completed,
        }
    }

    /// Opens the edit session and asks the next render of the edit input to
    /// take focus and select its text.
    pub fn start_editing(&mut self, task: &Task) {
        if !self.tasks.iter().any(|t| t.id == task.id) {
            return;
        }
        self.edit = Some(EditSession {
            task_id: task.id.clone(),
            draft: task.title.clone(),
        });
        self.focus_edit_input = true;
    }

    pub fn cancel_editing(&mut self) {
        self.edit = None;
        self.focus_edit_input = false;
    }

    pub fn save_edit(&self) -> Option<BackendCommand> {
        let session = self.edit.as_ref()?;
        let title = session.draft.trim();
        if title.is_empty() {
            return None;
        }
        Some(BackendCommand::RenameTask {
            task_id: session.task_id.clone(),
            title: title.to_string(),
        })
    }

    pub fn delete(&self, task: &Task) -> BackendCommand {
        BackendCommand::DeleteTask {
            task_id: task.id.clone(),
        }
    }

    /// Enter commits the input it was pressed in. Every other key is ignored.
    pub fn handle_key(&self, key: Key, mode: InputMode) -> Option<BackendCommand> {
        if key != Key::Enter {
            return None;
        }
        match mode {
            InputMode::Add => self.add(),
            InputMode::Edit => self.save_edit(),
        }
    }

    /// Returns true once after [`Self::start_editing`].
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_edit_input)
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::TasksLoaded(tasks) => {
                self.tasks = tasks;
                self.drop_stale_edit_session();
            }
            UiEvent::TaskCreated(task) => {
                self.tasks.insert(0, task);
                self.new_task_draft.clear();
            }
            UiEvent::CompletionToggled(task) => {
                self.replace_task(task);
            }
            UiEvent::TaskRenamed(task) => {
                // A newer session on another task keeps its draft.
                if self.is_editing(&task.id) {
                    self.cancel_editing();
                }
                self.replace_task(task);
            }
            UiEvent::TaskDeleted(task_id) => {
                self.tasks.retain(|t| t.id != task_id);
                self.drop_stale_edit_session();
            }
            UiEvent::Failed(err) => {
                error!(
                    operation = err.context().describe(),
                    error = err.message(),
                    "remote operation failed"
                );
            }
        }
    }

    fn replace_task(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn drop_stale_edit_session(&mut self) {
        let stale = self
            .edit
            .as_ref()
            .is_some_and(|session| !self.tasks.iter().any(|t| t.id == session.task_id));
        if stale {
            self.cancel_editing();
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
