/// SQLite persistence layer for workflows and their versions
///
/// Workflow payloads are stored as JSON text. SQLite takes its write lock when an INSERT
/// starts, so the version subquery and the insert it feeds see the same snapshot.

use crate::config::DatabaseConfig;
use crate::workflow::types::{UploadResponse, VersionPayload};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row, SqliteConnection,
};
use std::{str::FromStr, time::Duration};
use uuid::Uuid;

/// SQLite-based workflow storage manager
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    /// SQLite connection pool for workflow database
    pool: SqlitePool,
}

/// A workflow parent row
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkflowRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored version of a workflow
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkflowVersionRecord {
    pub id: String,
    pub workflow_id: String,
    pub version: i64,
    pub workflow: serde_json::Value,
    pub workflow_api: serde_json::Value,
    pub created_at: String,
}

impl WorkflowStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) the database described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database URL '{}'", config.url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let filename = options.get_filename();
        if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory '{}'", parent.display())
                })?;
            }
        }

        tracing::info!("🗄️ Opening workflow database: {}", filename.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Initialize the workflow storage schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_versions (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL REFERENCES workflows(id) ON DELETE CASCADE,
                version INTEGER NOT NULL CHECK (version > 0),
                workflow JSON NOT NULL,
                workflow_api JSON NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (workflow_id, version)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_workflows_user_id ON workflows(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a workflow owned by `user_id` together with its version 1
    ///
    /// Both rows commit together or not at all; dropping the future mid-write rolls back.
    pub async fn create_workflow(
        &self,
        user_id: &str,
        name: &str,
        payload: &VersionPayload,
    ) -> Result<UploadResponse> {
        let mut tx = self.pool.begin().await?;
        let created = insert_workflow_with_first_version(&mut tx, user_id, name, payload).await?;
        tx.commit().await?;

        Ok(created)
    }

    /// Store `payload` as the next version of `workflow_id`
    ///
    /// The version number is computed by the insert statement itself.
    pub async fn append_version(
        &self,
        workflow_id: &str,
        payload: &VersionPayload,
    ) -> Result<UploadResponse> {
        let version = insert_next_version(&self.pool, workflow_id, payload).await?;

        Ok(UploadResponse {
            workflow_id: workflow_id.to_string(),
            version,
        })
    }

    /// Retrieve a workflow parent row by ID
    pub async fn get_workflow(&self, id: &str) -> Result<Option<WorkflowRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, name, created_at, updated_at FROM workflows WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| WorkflowRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// List every workflow owned by a user, newest first
    pub async fn list_workflows_for_user(&self, user_id: &str) -> Result<Vec<WorkflowRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, created_at, updated_at FROM workflows \
             WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut workflows = Vec::new();
        for row in rows {
            workflows.push(WorkflowRecord {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(workflows)
    }

    /// All versions of a workflow in ascending order
    pub async fn list_versions(&self, workflow_id: &str) -> Result<Vec<WorkflowVersionRecord>> {
        let rows = sqlx::query(
            "SELECT id, workflow_id, version, workflow, workflow_api, created_at \
             FROM workflow_versions WHERE workflow_id = ? ORDER BY version ASC",
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await?;

        let mut versions = Vec::new();
        for row in rows {
            let workflow_json: String = row.get("workflow");
            let workflow_api_json: String = row.get("workflow_api");
            versions.push(WorkflowVersionRecord {
                id: row.get("id"),
                workflow_id: row.get("workflow_id"),
                version: row.get("version"),
                workflow: serde_json::from_str(&workflow_json)?,
                workflow_api: serde_json::from_str(&workflow_api_json)?,
                created_at: row.get("created_at"),
            });
        }

        Ok(versions)
    }
}

async fn insert_workflow_with_first_version(
    conn: &mut SqliteConnection,
    user_id: &str,
    name: &str,
    payload: &VersionPayload,
) -> Result<UploadResponse> {
    let workflow_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO workflows (id, user_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&workflow_id)
    .bind(user_id)
    .bind(name)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query(
        r#"
        INSERT INTO workflow_versions (id, workflow_id, version, workflow, workflow_api, created_at)
        VALUES (?, ?, 1, ?, ?, ?)
        RETURNING version
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&workflow_id)
    .bind(serde_json::to_string(&payload.workflow)?)
    .bind(serde_json::to_string(&payload.workflow_api)?)
    .bind(&now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(UploadResponse {
        workflow_id,
        version: row.get("version"),
    })
}

async fn insert_next_version(
    pool: &SqlitePool,
    workflow_id: &str,
    payload: &VersionPayload,
) -> Result<i64> {
    let row = sqlx::query(
        r#"
        INSERT INTO workflow_versions (id, workflow_id, version, workflow, workflow_api, created_at)
        VALUES (
            ?, ?,
            (SELECT COALESCE(MAX(version), 0) + 1 FROM workflow_versions WHERE workflow_id = ?),
            ?, ?, ?
        )
        RETURNING version
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(workflow_id)
    .bind(workflow_id)
    .bind(serde_json::to_string(&payload.workflow)?)
    .bind(serde_json::to_string(&payload.workflow_api)?)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    Ok(row.get("version"))
}
