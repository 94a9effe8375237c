//! Backend commands queued from UI to backend worker.

use shared::domain::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    LoadTasks,
    CreateTask { title: String },
    SetCompleted { task_id: TaskId, completed: bool },
    RenameTask { task_id: TaskId, title: String },
    DeleteTask { task_id: TaskId },
}
