use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use storage::Storage;

#[derive(Parser, Debug)]
#[command(name = "tools", about = "Operator commands for the todo database")]
struct Cli {
    #[arg(long, default_value = "sqlite://todos.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every task, newest first.
    List,
    Add {
        title: String,
    },
    /// Delete all completed tasks.
    PurgeCompleted,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List => {
            for task in storage.list_tasks().await? {
                let mark = if task.completed { "x" } else { " " };
                println!("[{mark}] {} {} ({})", task.id, task.title, task.created_at);
            }
        }
        Command::Add { title } => {
            let title = title.trim();
            if title.is_empty() {
                bail!("title must not be empty");
            }
            let task = storage.create_task(title).await?;
            println!("created task_id={}", task.id);
        }
        Command::PurgeCompleted => {
            let removed = storage.delete_completed().await?;
            println!("removed {removed} completed task(s)");
        }
    }

    Ok(())
}
