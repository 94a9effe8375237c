mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{StartupConfig, TodoApp};

#[derive(Parser, Debug)]
#[command(name = "desktop_gui", about = "Desktop client for the todo service")]
struct Args {
    /// Base URL of the todo server.
    #[arg(long, env = "TODO_SERVER_URL", default_value_t = StartupConfig::default().server_url)]
    server_url: String,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let startup = StartupConfig {
        server_url: args.server_url,
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(&startup.server_url, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Todo App")
            .with_inner_size([520.0, 640.0])
            .with_min_inner_size([360.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Todo App",
        options,
        Box::new(|_cc| Ok(Box::new(TodoApp::new(cmd_tx, ui_rx)))),
    )
}
