use std::fmt;

use thiserror::Error;

use crate::types::WarnContentId;

/// Unified application error for the binary.
///
/// Startup failures (config, database, listener) end up here so `main`
/// can log them once and exit.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Failure of a single record-store call.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{operation} failed: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} returned a malformed row: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl StorageError {
    pub fn database(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Database { operation, source }
    }

    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
        }
    }

    /// Log this failure once with the call's key ids and hand it back.
    pub(crate) fn logged(self, context: fmt::Arguments<'_>) -> Self {
        tracing::error!("{} err, {}: {}", self.operation(), context, self);
        self
    }

    /// Name of the store operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Database { operation, .. } | Self::Decode { operation, .. } => operation,
        }
    }
}

/// Errors from the warning fan-out workflow.
///
/// The "nothing to do" outcome is not an error; it is `Ok(None)`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("monitor user lookup failed: {0}")]
    Directory(#[source] StorageError),

    /// Content was persisted but the per-user rows were not. The content row
    /// stays in place with no warnings referencing it.
    #[error("warn content {content_id} persisted but fan-out failed: {source}")]
    FanoutIncomplete {
        content_id: WarnContentId,
        #[source]
        source: StorageError,
    },
}

impl ServiceError {
    /// Id of the orphaned content row, if the failure left one behind.
    pub fn orphaned_content(&self) -> Option<WarnContentId> {
        match self {
            Self::FanoutIncomplete { content_id, .. } => Some(*content_id),
            _ => None,
        }
    }
}
