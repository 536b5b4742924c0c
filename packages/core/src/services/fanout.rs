//! Warning fan-out.
//!
//! One warning event becomes one content row plus one `user_warn` row per
//! recipient. The content row is always written first so every fan-out row
//! references content that exists.
//!
//! The two writes are independent store calls. If the batch insert fails
//! after the content was written, the content row stays behind with no
//! warnings pointing at it and the caller gets
//! [`ServiceError::FanoutIncomplete`] carrying its id. Nothing is rolled
//! back or retried.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::directory::MonitorUserDirectory;
use crate::error::{ServiceError, StorageError};
use crate::repository::WarnRecordStore;
use crate::services::WarnContentService;
use crate::types::{NewUserWarn, UserId, WarnContent, WarnType};

/// Result of a fan-out that actually wrote something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutOutcome {
    pub content: WarnContent,
    /// Number of distinct recipients rows were built for.
    pub recipients: usize,
    /// Rows the store reported as inserted.
    pub inserted: u64,
}

pub struct WarnFanoutService {
    contents: Arc<WarnContentService>,
    store: Arc<dyn WarnRecordStore>,
    directory: Arc<dyn MonitorUserDirectory>,
}

impl WarnFanoutService {
    pub fn new(
        contents: Arc<WarnContentService>,
        store: Arc<dyn WarnRecordStore>,
        directory: Arc<dyn MonitorUserDirectory>,
    ) -> Self {
        Self {
            contents,
            store,
            directory,
        }
    }

    /// Record a warning for `recipients`, or for the monitor users when
    /// `recipients` is empty.
    ///
    /// Returns `Ok(None)` when there is nothing to do: no `content`, or no
    /// recipients even after falling back to the monitor users. Nothing is
    /// persisted in either case.
    pub async fn save(
        &self,
        recipients: &BTreeSet<UserId>,
        warn_type: WarnType,
        resource: &str,
        content: Option<&str>,
    ) -> Result<Option<FanoutOutcome>, ServiceError> {
        let Some(content) = content else {
            tracing::debug!("No content for {} warn on {}, skipping", warn_type, resource);
            return Ok(None);
        };

        let recipients = self.resolve_recipients(recipients).await?;
        if recipients.is_empty() {
            tracing::debug!("No recipients for {} warn on {}, skipping", warn_type, resource);
            return Ok(None);
        }

        let content = self.contents.persist(content).await?;

        let records: Vec<NewUserWarn> = recipients
            .iter()
            .map(|&uid| NewUserWarn {
                uid,
                warn_type,
                resource: resource.to_string(),
                wid: content.id,
            })
            .collect();

        let inserted = self
            .batch_save(&records)
            .await
            .map_err(|source| ServiceError::FanoutIncomplete {
                content_id: content.id,
                source,
            })?;

        tracing::info!(
            "Saved {} warn on {} (wid: {}) for {} users",
            warn_type,
            resource,
            content.id,
            inserted
        );

        Ok(Some(FanoutOutcome {
            content,
            recipients: records.len(),
            inserted,
        }))
    }

    /// Insert pre-built warning rows in a single store call.
    pub async fn batch_save(&self, records: &[NewUserWarn]) -> Result<u64, StorageError> {
        self.store.batch_insert_user_warns(records).await
    }

    async fn resolve_recipients(
        &self,
        explicit: &BTreeSet<UserId>,
    ) -> Result<BTreeSet<UserId>, ServiceError> {
        if !explicit.is_empty() {
            return Ok(explicit.clone());
        }

        let users = self
            .directory
            .query_monitor_users()
            .await
            .map_err(ServiceError::Directory)?;

        Ok(users.into_iter().map(|u| u.id).collect())
    }
}
