//! SQLite persistence for task results
//!
//! Optional sink behind the history ledger. Each result is one row; the
//! list fields are stored as JSON text columns. The in-memory ledger is
//! authoritative for the API, the database is an audit trail that
//! survives restarts.

use crate::history::{ResultSink, TaskResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteResultSink {
    pool: Pool<Sqlite>,
}

impl SqliteResultSink {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to open results database")?;

        let sink = Self { pool };
        sink.initialize().await?;
        Ok(sink)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS task_results (
                run_id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL,
                success BOOLEAN NOT NULL,
                message TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                timestamp DATETIME NOT NULL,
                logs TEXT NOT NULL DEFAULT '[]',
                errors TEXT NOT NULL DEFAULT '[]',
                warnings TEXT NOT NULL DEFAULT '[]',
                payload TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_task_results_task_time
            ON task_results (task_id, timestamp DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent stored rows for a task, newest first
    pub async fn recent_results(&self, task_id: &str, limit: i64) -> Result<Vec<TaskResult>> {
        let rows = sqlx::query(
            r#"
            SELECT run_id, task_id, success, message, duration_ms, timestamp,
                   logs, errors, warnings, payload
            FROM task_results
            WHERE task_id = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(task_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(row_to_result(&row)?);
        }
        Ok(results)
    }
}

fn row_to_result(row: &SqliteRow) -> Result<TaskResult> {
    let logs: String = row.try_get("logs")?;
    let errors: String = row.try_get("errors")?;
    let warnings: String = row.try_get("warnings")?;
    let payload: Option<String> = row.try_get("payload")?;

    Ok(TaskResult {
        run_id: row.try_get("run_id")?,
        task_id: row.try_get("task_id")?,
        success: row.try_get("success")?,
        message: row.try_get("message")?,
        duration_ms: row.try_get::<i64, _>("duration_ms")? as u64,
        timestamp: row.try_get("timestamp")?,
        logs: serde_json::from_str(&logs).unwrap_or_default(),
        errors: serde_json::from_str(&errors).unwrap_or_default(),
        warnings: serde_json::from_str(&warnings).unwrap_or_default(),
        payload: payload.and_then(|p| serde_json::from_str(&p).ok()),
    })
}

#[async_trait]
impl ResultSink for SqliteResultSink {
    async fn record(&self, result: &TaskResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO task_results
                (run_id, task_id, success, message, duration_ms, timestamp,
                 logs, errors, warnings, payload)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.run_id)
        .bind(&result.task_id)
        .bind(result.success)
        .bind(&result.message)
        .bind(result.duration_ms as i64)
        .bind(result.timestamp)
        .bind(serde_json::to_string(&result.logs)?)
        .bind(serde_json::to_string(&result.errors)?)
        .bind(serde_json::to_string(&result.warnings)?)
        .bind(result.payload.as_ref().map(|p| p.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
