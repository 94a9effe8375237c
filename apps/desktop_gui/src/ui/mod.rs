//! UI layer for the desktop client: the task list window.

pub mod app;

pub use app::{StartupConfig, TodoApp};
