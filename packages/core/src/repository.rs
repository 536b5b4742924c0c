//! Warning record persistence.
//!
//! [`WarnRecordStore`] is the storage contract the services are written
//! against. [`WarnRepository`] is the SQLite implementation: every failure,
//! whether the driver's or a malformed row's, is logged once here with the
//! operation name and the key ids, and turned into a [`StorageError`].
//!
//! Timestamps are assigned by the database and stored as millisecond UTC
//! RFC 3339 strings, so `>=` on the text column is a time comparison.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::StorageError;
use crate::types::{
    NewUserWarn, UserId, UserWarn, UserWarnCount, WarnContent, WarnContentId, WarnType,
};

/// Rows per INSERT statement; keeps bind counts well under SQLite's limit.
const BATCH_CHUNK: usize = 500;

const USER_WARN_SELECT: &str = "SELECT w.id AS id, w.uid AS uid, w.type AS warn_type,
        w.resource AS resource, w.wid AS wid, w.create_time AS create_time,
        c.content AS content
     FROM user_warn w
     LEFT JOIN warn_content c ON c.id = w.wid";

/// Storage contract for warning content and per-user warning rows.
#[async_trait]
pub trait WarnRecordStore: Send + Sync {
    /// Insert one content row; the store assigns `id` and `create_time`.
    async fn insert_content(&self, content: &str) -> Result<WarnContent, StorageError>;

    /// Insert all rows in one call. Returns the number of rows accepted.
    async fn batch_insert_user_warns(&self, records: &[NewUserWarn]) -> Result<u64, StorageError>;

    /// A page of a user's warnings, newest first.
    async fn select_by_user(
        &self,
        uid: UserId,
        offset: u32,
        size: u32,
    ) -> Result<Vec<UserWarn>, StorageError>;

    async fn select_count(&self, uid: UserId) -> Result<i64, StorageError>;

    /// Per-day counts of a user's warnings created at or after `cutoff`.
    async fn select_count_since(
        &self,
        uid: UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<UserWarnCount>, StorageError>;

    /// The warning raised under content `wid`, with its text. Every recipient
    /// row of one event carries the same metadata; the first one is returned.
    async fn select_by_id(&self, wid: WarnContentId) -> Result<Option<UserWarn>, StorageError>;
}

/// Format a timestamp the way the schema defaults do.
pub fn to_db_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_db_time(operation: &'static str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::decode(operation, format!("bad timestamp {:?}: {}", raw, e)))
}

fn failed(operation: &'static str, context: fmt::Arguments<'_>, source: sqlx::Error) -> StorageError {
    StorageError::database(operation, source).logged(context)
}

fn content_from_row(operation: &'static str, row: &SqliteRow) -> Result<WarnContent, StorageError> {
    let column = |e| StorageError::database(operation, e);

    let create_time: String = row.try_get("create_time").map_err(column)?;

    Ok(WarnContent {
        id: row.try_get("id").map_err(column)?,
        content: row.try_get("content").map_err(column)?,
        create_time: parse_db_time(operation, &create_time)?,
    })
}

fn user_warn_from_row(operation: &'static str, row: &SqliteRow) -> Result<UserWarn, StorageError> {
    let column = |e| StorageError::database(operation, e);

    let tag: i64 = row.try_get("warn_type").map_err(column)?;
    let warn_type = i32::try_from(tag)
        .ok()
        .and_then(WarnType::from_tag)
        .ok_or_else(|| StorageError::decode(operation, format!("unknown warn type tag {}", tag)))?;
    let create_time: String = row.try_get("create_time").map_err(column)?;

    Ok(UserWarn {
        id: row.try_get("id").map_err(column)?,
        uid: row.try_get("uid").map_err(column)?,
        warn_type,
        resource: row.try_get("resource").map_err(column)?,
        wid: row.try_get("wid").map_err(column)?,
        create_time: parse_db_time(operation, &create_time)?,
        content: row.try_get("content").map_err(column)?,
    })
}

fn count_from_row(operation: &'static str, row: &SqliteRow) -> Result<UserWarnCount, StorageError> {
    let column = |e| StorageError::database(operation, e);

    let day: String = row.try_get("day").map_err(column)?;
    let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|e| StorageError::decode(operation, format!("bad day {:?}: {}", day, e)))?;

    Ok(UserWarnCount {
        date,
        count: row.try_get("cnt").map_err(column)?,
    })
}

/// SQLite-backed [`WarnRecordStore`].
#[derive(Clone)]
pub struct WarnRepository {
    pool: SqlitePool,
}

impl WarnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarnRecordStore for WarnRepository {
    async fn insert_content(&self, content: &str) -> Result<WarnContent, StorageError> {
        const OP: &str = "insert_content";

        let row = sqlx::query(
            "INSERT INTO warn_content (content) VALUES (?) RETURNING id, content, create_time",
        )
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| failed(OP, format_args!("content: {:?}", content), e))?;

        content_from_row(OP, &row).map_err(|e| e.logged(format_args!("content: {:?}", content)))
    }

    async fn batch_insert_user_warns(&self, records: &[NewUserWarn]) -> Result<u64, StorageError> {
        const OP: &str = "batch_insert_user_warns";

        if records.is_empty() {
            return Ok(0);
        }

        let wid = records[0].wid;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| failed(OP, format_args!("wid: {} rows: {}", wid, records.len()), e))?;

        let mut inserted = 0;
        for chunk in records.chunks(BATCH_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO user_warn (uid, type, resource, wid) ");
            builder.push_values(chunk, |mut row, warn| {
                row.push_bind(warn.uid)
                    .push_bind(warn.warn_type.tag())
                    .push_bind(warn.resource.clone())
                    .push_bind(warn.wid);
            });

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| failed(OP, format_args!("wid: {} rows: {}", wid, records.len()), e))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| failed(OP, format_args!("wid: {} rows: {}", wid, records.len()), e))?;

        Ok(inserted)
    }

    async fn select_by_user(
        &self,
        uid: UserId,
        offset: u32,
        size: u32,
    ) -> Result<Vec<UserWarn>, StorageError> {
        const OP: &str = "select_by_user";

        let sql = format!("{} WHERE w.uid = ? ORDER BY w.id DESC LIMIT ? OFFSET ?", USER_WARN_SELECT);
        let rows = sqlx::query(&sql)
            .bind(uid)
            .bind(i64::from(size))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| failed(OP, format_args!("uid: {} offset: {} size: {}", uid, offset, size), e))?;

        rows.iter()
            .map(|row| user_warn_from_row(OP, row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.logged(format_args!("uid: {} offset: {} size: {}", uid, offset, size)))
    }

    async fn select_count(&self, uid: UserId) -> Result<i64, StorageError> {
        const OP: &str = "select_count";

        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM user_warn WHERE uid = ?")
            .bind(uid)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| failed(OP, format_args!("uid: {}", uid), e))?;

        row.try_get("cnt")
            .map_err(|e| failed(OP, format_args!("uid: {}", uid), e))
    }

    async fn select_count_since(
        &self,
        uid: UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<UserWarnCount>, StorageError> {
        const OP: &str = "select_count_since";

        let cutoff_str = to_db_time(cutoff);
        let rows = sqlx::query(
            "SELECT substr(create_time, 1, 10) AS day, COUNT(*) AS cnt
             FROM user_warn
             WHERE uid = ? AND create_time >= ?
             GROUP BY day
             ORDER BY day ASC",
        )
        .bind(uid)
        .bind(&cutoff_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| failed(OP, format_args!("uid: {} cutoff: {}", uid, cutoff_str), e))?;

        rows.iter()
            .map(|row| count_from_row(OP, row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.logged(format_args!("uid: {} cutoff: {}", uid, cutoff_str)))
    }

    async fn select_by_id(&self, wid: WarnContentId) -> Result<Option<UserWarn>, StorageError> {
        const OP: &str = "select_by_id";

        let sql = format!("{} WHERE w.wid = ? ORDER BY w.id ASC LIMIT 1", USER_WARN_SELECT);
        let row = sqlx::query(&sql)
            .bind(wid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| failed(OP, format_args!("wid: {}", wid), e))?;

        row.as_ref()
            .map(|r| user_warn_from_row(OP, r))
            .transpose()
            .map_err(|e| e.logged(format_args!("wid: {}", wid)))
    }
}
