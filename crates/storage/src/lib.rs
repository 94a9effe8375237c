use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{Task, TaskId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty schema.
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run task migrations")?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Newest first; rows created within the same timestamp keep insertion order reversed.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, title, completed, created_at FROM todos
             ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list tasks")?;
        rows.iter().map(task_from_row).collect()
    }

    pub async fn create_task(&self, title: &str) -> Result<Task> {
        let task = Task {
            id: TaskId(Uuid::new_v4().to_string()),
            title: title.to_string(),
            completed: false,
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query("INSERT INTO todos (id, title, completed, created_at) VALUES (?, ?, ?, ?)")
            .bind(task.id.as_str())
            .bind(&task.title)
            .bind(task.completed as i64)
            .bind(&task.created_at)
            .execute(&self.pool)
            .await
            .context("failed to insert task")?;

        Ok(task)
    }

    pub async fn load_task(&self, task_id: &TaskId) -> Result<Option<Task>> {
        let row = sqlx::query("SELECT id, title, completed, created_at FROM todos WHERE id = ?")
            .bind(task_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load task {task_id}"))?;
        row.as_ref().map(task_from_row).transpose()
    }

    /// Applies the fields that are present and returns the merged row, or `None`
    /// when no task has this id.
    pub async fn update_task(
        &self,
        task_id: &TaskId,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id, title, completed, created_at FROM todos WHERE id = ?")
            .bind(task_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("failed to load task {task_id} for update"))?;
        let Some(existing) = existing.as_ref().map(task_from_row).transpose()? else {
            return Ok(None);
        };

        let merged = Task {
            title: title.map(str::to_string).unwrap_or(existing.title),
            completed: completed.unwrap_or(existing.completed),
            ..existing
        };

        sqlx::query("UPDATE todos SET title = ?, completed = ? WHERE id = ?")
            .bind(&merged.title)
            .bind(merged.completed as i64)
            .bind(merged.id.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to update task {task_id}"))?;

        tx.commit().await?;
        Ok(Some(merged))
    }

    /// Returns `false` when no task has this id.
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(task_id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete task {task_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_completed(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE completed = 1")
            .execute(&self.pool)
            .await
            .context("failed to purge completed tasks")?;
        Ok(result.rows_affected())
    }
}

fn task_from_row(row: &SqliteRow) -> Result<Task> {
    Ok(Task {
        id: TaskId(row.try_get("id")?),
        title: row.try_get("title")?,
        completed: row.try_get::<i64, _>("completed")? != 0,
        created_at: row.try_get("created_at")?,
    })
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
