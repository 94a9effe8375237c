use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use egui::text::{CCursor, CCursorRange};
use egui::{Key, RichText};
use shared::domain::Task;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{InputMode, TaskListState};

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// What a rendered row asked for during one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowAction {
    Add,
    ToggleComplete(Task),
    StartEditing(Task),
    Save,
    Cancel,
    Delete(Task),
    KeyPressed(Key, InputMode),
}

pub struct TodoApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    state: TaskListState,
    status: String,
}

impl TodoApp {
    /// Builds the app and queues the initial load.
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            state: TaskListState::default(),
            status: String::new(),
        };
        let load = app.state.load();
        app.dispatch(load);
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if let UiEvent::Failed(err) = &event {
                if err.context() == UiErrorContext::BackendStartup {
                    self.status = err.message().to_string();
                }
            }
            self.state.apply(event);
        }
    }

    fn handle_row_action(&mut self, action: RowAction) {
        let cmd = match action {
            RowAction::Add => self.state.add(),
            RowAction::ToggleComplete(task) => Some(self.state.toggle_complete(&task)),
            RowAction::StartEditing(task) => {
                self.state.start_editing(&task);
                None
            }
            RowAction::Save => self.state.save_edit(),
            RowAction::Cancel => {
                self.state.cancel_editing();
                None
            }
            RowAction::Delete(task) => Some(self.state.delete(&task)),
            RowAction::KeyPressed(key, mode) => self.state.handle_key(key, mode),
        };
        if let Some(cmd) = cmd {
            self.dispatch(cmd);
        }
    }

    fn show_new_task_row(&mut self, ui: &mut egui::Ui) -> Option<RowAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.state.new_task_draft)
                    .hint_text("What needs to be done?")
                    .desired_width(320.0),
            );
            if ui.button("Add").clicked() {
                action = Some(RowAction::Add);
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                action = Some(RowAction::KeyPressed(Key::Enter, InputMode::Add));
            }
        });
        action
    }

    fn show_task_list(&mut self, ui: &mut egui::Ui) -> Option<RowAction> {
        let tasks = self.state.tasks().to_vec();
        let mut action = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for task in &tasks {
                ui.horizontal(|ui| {
                    let mut completed = task.completed;
                    if ui.checkbox(&mut completed, "").changed() {
                        action = Some(RowAction::ToggleComplete(task.clone()));
                    }

                    if self.state.is_editing(&task.id) {
                        if let Some(row_action) = self.show_edit_input(ui, task) {
                            action = Some(row_action);
                        }
                        if ui.button("Save").clicked() {
                            action = Some(RowAction::Save);
                        }
                        if ui.button("Cancel").clicked() {
                            action = Some(RowAction::Cancel);
                        }
                    } else {
                        let mut title = RichText::new(&task.title);
                        if task.completed {
                            title = title.strikethrough().weak();
                        }
                        ui.label(title);
                        if ui.button("Edit").clicked() {
                            action = Some(RowAction::StartEditing(task.clone()));
                        }
                        if ui.button("Delete").clicked() {
                            action = Some(RowAction::Delete(task.clone()));
                        }
                    }
                });
            }
        });
        action
    }

    fn show_edit_input(&mut self, ui: &mut egui::Ui, task: &Task) -> Option<RowAction> {
        let focus = self.state.take_focus_request();
        let draft = self.state.edit_draft_mut()?;
        let len = draft.chars().count();

        let mut output = egui::TextEdit::singleline(draft)
            .id(egui::Id::new(("edit-task", task.id.as_str())))
            .desired_width(320.0)
            .show(ui);

        if focus {
            output.response.request_focus();
            output
                .state
                .cursor
                .set_char_range(Some(CCursorRange::two(CCursor::new(0), CCursor::new(len))));
            output.state.store(ui.ctx(), output.response.id);
        }

        (output.response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)))
            .then_some(RowAction::KeyPressed(Key::Enter, InputMode::Edit))
    }
}

impl eframe::App for TodoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Todo");
            ui.add_space(8.0);

            let mut actions = Vec::new();
            actions.extend(self.show_new_task_row(ui));
            ui.separator();
            actions.extend(self.show_task_list(ui));

            if !self.status.is_empty() {
                ui.separator();
                ui.label(RichText::new(&self.status).small());
            }

            for action in actions {
                self.handle_row_action(action);
            }
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::events::UiError;
    use crossbeam_channel::bounded;
    use shared::domain::TaskId;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: TaskId::new(id),
            title: title.to_string(),
            completed: false,
            created_at: "t0".to_string(),
        }
    }

    fn app() -> (TodoApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (ui_tx, ui_rx) = bounded(16);
        (TodoApp::new(cmd_tx, ui_rx), cmd_rx, ui_tx)
    }

    #[test]
    fn new_app_queues_initial_load() {
        let (_app, cmd_rx, _ui_tx) = app();
        assert_eq!(cmd_rx.try_recv().expect("load"), BackendCommand::LoadTasks);
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn pending_events_are_drained_in_arrival_order() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::TasksLoaded(vec![task("1", "a")]))
            .expect("send");
        ui_tx
            .send(UiEvent::TaskCreated(task("2", "b")))
            .expect("send");

        app.process_ui_events();

        let ids: Vec<&str> = app.state.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn backend_startup_failure_is_shown_in_status() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::Failed(UiError::from_message(
                UiErrorContext::BackendStartup,
                "invalid server url",
            )))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.status, "invalid server url");
    }

    #[test]
    fn row_actions_queue_the_matching_commands() {
        let (mut app, cmd_rx, ui_tx) = app();
        let _ = cmd_rx.try_recv();
        let a = task("1", "a");
        ui_tx
            .send(UiEvent::TasksLoaded(vec![a.clone()]))
            .expect("send");
        app.process_ui_events();

        app.handle_row_action(RowAction::ToggleComplete(a.clone()));
        app.handle_row_action(RowAction::StartEditing(a.clone()));
        *app.state.edit_draft_mut().expect("session") = "renamed".to_string();
        app.handle_row_action(RowAction::KeyPressed(Key::Enter, InputMode::Edit));
        app.handle_row_action(RowAction::Delete(a.clone()));

        let queued: Vec<BackendCommand> = cmd_rx.try_iter().collect();
        assert_eq!(
            queued,
            vec![
                BackendCommand::SetCompleted {
                    task_id: a.id.clone(),
                    completed: true
                },
                BackendCommand::RenameTask {
                    task_id: a.id.clone(),
                    title: "renamed".to_string()
                },
                BackendCommand::DeleteTask { task_id: a.id },
            ]
        );
    }

    #[test]
    fn cancel_queues_nothing() {
        let (mut app, cmd_rx, ui_tx) = app();
        let _ = cmd_rx.try_recv();
        let a = task("1", "a");
        ui_tx.send(UiEvent::TasksLoaded(vec![a.clone()])).expect("send");
        app.process_ui_events();

        app.handle_row_action(RowAction::StartEditing(a));
        app.handle_row_action(RowAction::Cancel);

        assert!(app.state.edit_session().is_none());
        assert!(cmd_rx.try_recv().is_err());
    }
}
