//! In-memory collaborators with fault injection, for service tests.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::directory::MonitorUserDirectory;
use crate::error::StorageError;
use crate::repository::WarnRecordStore;
use crate::types::{
    NewUserWarn, User, UserId, UserWarn, UserWarnCount, UserWarnId, WarnContent, WarnContentId,
    WarnType,
};

#[derive(Default)]
struct State {
    contents: Vec<WarnContent>,
    warns: Vec<UserWarn>,
    batch_calls: usize,
}

#[derive(Default)]
pub(crate) struct MemoryWarnStore {
    state: Mutex<State>,
    fail_content: bool,
    fail_batch: bool,
    fail_reads: bool,
}

fn injected(operation: &'static str) -> StorageError {
    StorageError::database(operation, sqlx::Error::PoolTimedOut)
}

impl MemoryWarnStore {
    pub fn failing_content(mut self) -> Self {
        self.fail_content = true;
        self
    }

    pub fn failing_batch(mut self) -> Self {
        self.fail_batch = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn contents(&self) -> Vec<WarnContent> {
        self.state.lock().unwrap().contents.clone()
    }

    pub fn warns(&self) -> Vec<UserWarn> {
        self.state.lock().unwrap().warns.clone()
    }

    pub fn batch_calls(&self) -> usize {
        self.state.lock().unwrap().batch_calls
    }

    /// Seed a warning row with an explicit creation time. The row is its own
    /// event: its `wid` equals the returned id.
    pub fn push_warn(&self, uid: UserId, create_time: DateTime<Utc>) -> UserWarnId {
        let mut state = self.state.lock().unwrap();
        let id = state.warns.len() as i64 + 1;
        state.warns.push(UserWarn {
            id,
            uid,
            warn_type: WarnType::ConsumeBlocked,
            resource: format!("group-{}", id),
            wid: id,
            create_time,
            content: None,
        });
        id
    }
}

#[async_trait]
impl WarnRecordStore for MemoryWarnStore {
    async fn insert_content(&self, content: &str) -> Result<WarnContent, StorageError> {
        if self.fail_content {
            return Err(injected("insert_content"));
        }
        let mut state = self.state.lock().unwrap();
        let row = WarnContent {
            id: state.contents.len() as i64 + 1,
            content: content.to_string(),
            create_time: Utc::now(),
        };
        state.contents.push(row.clone());
        Ok(row)
    }

    async fn batch_insert_user_warns(&self, records: &[NewUserWarn]) -> Result<u64, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.batch_calls += 1;
        if self.fail_batch {
            return Err(injected("batch_insert_user_warns"));
        }
        for record in records {
            let content = state
                .contents
                .iter()
                .find(|c| c.id == record.wid)
                .map(|c| c.content.clone());
            let id = state.warns.len() as i64 + 1;
            state.warns.push(UserWarn {
                id,
                uid: record.uid,
                warn_type: record.warn_type,
                resource: record.resource.clone(),
                wid: record.wid,
                create_time: Utc::now(),
                content,
            });
        }
        Ok(records.len() as u64)
    }

    async fn select_by_user(
        &self,
        uid: UserId,
        offset: u32,
        size: u32,
    ) -> Result<Vec<UserWarn>, StorageError> {
        if self.fail_reads {
            return Err(injected("select_by_user"));
        }
        let state = self.state.lock().unwrap();
        let mut warns: Vec<_> = state.warns.iter().filter(|w| w.uid == uid).cloned().collect();
        warns.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(warns
            .into_iter()
            .skip(offset as usize)
            .take(size as usize)
            .collect())
    }

    async fn select_count(&self, uid: UserId) -> Result<i64, StorageError> {
        if self.fail_reads {
            return Err(injected("select_count"));
        }
        let state = self.state.lock().unwrap();
        Ok(state.warns.iter().filter(|w| w.uid == uid).count() as i64)
    }

    async fn select_count_since(
        &self,
        uid: UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<UserWarnCount>, StorageError> {
        if self.fail_reads {
            return Err(injected("select_count_since"));
        }
        let state = self.state.lock().unwrap();
        let mut by_day = BTreeMap::new();
        for warn in state.warns.iter().filter(|w| w.uid == uid && w.create_time >= cutoff) {
            *by_day.entry(warn.create_time.date_naive()).or_insert(0) += 1;
        }
        Ok(by_day
            .into_iter()
            .map(|(date, count)| UserWarnCount { date, count })
            .collect())
    }

    async fn select_by_id(&self, wid: WarnContentId) -> Result<Option<UserWarn>, StorageError> {
        if self.fail_reads {
            return Err(injected("select_by_id"));
        }
        let state = self.state.lock().unwrap();
        Ok(state.warns.iter().find(|w| w.wid == wid).cloned())
    }
}

/// Directory returning a fixed user list, or failing.
#[derive(Default)]
pub(crate) struct StaticDirectory {
    users: Vec<User>,
    fail: bool,
    calls: Mutex<usize>,
}

impl StaticDirectory {
    pub fn with_monitors(ids: &[UserId]) -> Self {
        let users = ids
            .iter()
            .map(|&id| User {
                id,
                name: format!("monitor-{}", id),
                email: format!("monitor-{}@example.com", id),
                monitor: true,
            })
            .collect();
        Self {
            users,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl MonitorUserDirectory for StaticDirectory {
    async fn query_monitor_users(&self) -> Result<Vec<User>, StorageError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(injected("query_monitor_users"));
        }
        Ok(self.users.clone())
    }
}

/// Log sink for asserting on what a code path wrote through `tracing`.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route events on the current thread here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
