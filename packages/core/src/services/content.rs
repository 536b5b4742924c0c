use std::sync::Arc;

use crate::error::StorageError;
use crate::repository::WarnRecordStore;
use crate::types::WarnContent;

/// Persists one shared content row per warning event.
pub struct WarnContentService {
    store: Arc<dyn WarnRecordStore>,
}

impl WarnContentService {
    pub fn new(store: Arc<dyn WarnRecordStore>) -> Self {
        Self { store }
    }

    /// Insert `content` and return the stored row. Not retried.
    pub async fn persist(&self, content: &str) -> Result<WarnContent, StorageError> {
        self.store.insert_content(content).await
    }
}
