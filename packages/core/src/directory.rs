//! Monitor-user lookup.
//!
//! When a warning is raised without explicit recipients it goes to the
//! monitor users: console users flagged with `monitor = 1`.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::error::StorageError;
use crate::types::{User, UserId};

/// Resolves the default recipients of a warning.
#[async_trait]
pub trait MonitorUserDirectory: Send + Sync {
    async fn query_monitor_users(&self) -> Result<Vec<User>, StorageError>;
}

/// SQLite-backed directory over the `console_user` table.
#[derive(Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a console user. Returns the new row id.
    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        monitor: bool,
    ) -> Result<UserId, StorageError> {
        let result = sqlx::query("INSERT INTO console_user (name, email, monitor) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(if monitor { 1i64 } else { 0i64 })
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database("insert_user", e).logged(format_args!("name: {}", name)))?;

        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl MonitorUserDirectory for UserDirectory {
    async fn query_monitor_users(&self) -> Result<Vec<User>, StorageError> {
        const OP: &str = "query_monitor_users";

        let rows = sqlx::query(
            "SELECT id, name, email, monitor FROM console_user WHERE monitor = 1 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::database(OP, e).logged(format_args!("filter: monitor = 1")))?;

        rows.iter()
            .map(|row| -> Result<User, StorageError> {
                let column = |e| StorageError::database(OP, e);
                Ok(User {
                    id: row.try_get("id").map_err(column)?,
                    name: row.try_get("name").map_err(column)?,
                    email: row.try_get("email").map_err(column)?,
                    monitor: row.try_get::<i64, _>("monitor").map_err(column)? != 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.logged(format_args!("filter: monitor = 1, rows: {}", rows.len())))
    }
}
