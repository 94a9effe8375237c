//! Backend bridge: commands the UI queues and the worker that runs them.

pub mod commands;
pub mod runtime;
