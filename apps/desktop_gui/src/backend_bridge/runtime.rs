//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread, time::Duration};

use client_core::{HttpTaskCollection, TaskCollection};
use crossbeam_channel::{Receiver, Sender};
use shared::protocol::{CreateTaskRequest, UpdateTaskRequest};
use tracing::{debug, error, info};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(server_url: &str, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let collection = match HttpTaskCollection::new(server_url) {
        Ok(collection) => collection,
        Err(err) => {
            error!(%server_url, "backend worker startup failure: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Failed(UiError::from_error(
                UiErrorContext::BackendStartup,
                &err,
            )));
            return;
        }
    };
    info!(server_url = %collection.base_url(), "task service configured");
    spawn_worker(Arc::new(collection), cmd_rx, ui_tx);
}

/// Runs the backend on its own thread. Each command becomes an independent
/// task, so responses reach the UI in completion order, not send order.
pub fn spawn_worker(
    collection: Arc<dyn TaskCollection>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::Failed(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                return;
            }
        };
        debug!("backend worker ready");

        while let Ok(cmd) = cmd_rx.recv() {
            let collection = Arc::clone(&collection);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let event = execute(collection.as_ref(), cmd).await;
                if ui_tx.send(event).is_err() {
                    debug!("ui event receiver dropped; discarding backend event");
                }
            });
        }

        debug!("ui command queue closed; stopping backend worker");
        runtime.shutdown_timeout(Duration::from_secs(1));
    })
}

/// Performs the single remote call behind `cmd` and maps its outcome to one event.
pub async fn execute(collection: &dyn TaskCollection, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::LoadTasks => match collection.list_tasks().await {
            Ok(tasks) => UiEvent::TasksLoaded(tasks),
            Err(err) => failed(UiErrorContext::LoadTasks, &err),
        },
        BackendCommand::CreateTask { title } => {
            match collection.create_task(&CreateTaskRequest::new(title)).await {
                Ok(task) => UiEvent::TaskCreated(task),
                Err(err) => failed(UiErrorContext::CreateTask, &err),
            }
        }
        BackendCommand::SetCompleted { task_id, completed } => {
            let request = UpdateTaskRequest::completed(completed);
            match collection.update_task(&task_id, &request).await {
                Ok(task) => UiEvent::CompletionToggled(task),
                Err(err) => failed(UiErrorContext::ToggleComplete, &err),
            }
        }
        BackendCommand::RenameTask { task_id, title } => {
            let request = UpdateTaskRequest::title(title);
            match collection.update_task(&task_id, &request).await {
                Ok(task) => UiEvent::TaskRenamed(task),
                Err(err) => failed(UiErrorContext::SaveEdit, &err),
            }
        }
        BackendCommand::DeleteTask { task_id } => match collection.delete_task(&task_id).await {
            Ok(()) => UiEvent::TaskDeleted(task_id),
            Err(err) => failed(UiErrorContext::DeleteTask, &err),
        },
    }
}

fn failed(context: UiErrorContext, err: &anyhow::Error) -> UiEvent {
    UiEvent::Failed(UiError::from_error(context, err))
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
