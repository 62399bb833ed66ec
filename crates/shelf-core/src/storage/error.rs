//! Storage error handling
//!
//! Provides typed errors for key-value operations. Callers in this crate
//! never surface these to the reader; they log and fall back to defaults.

use thiserror::Error;
use tracing::warn;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The store does not exist in this environment (disabled, private mode)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The store refused a write because it is full
    #[error("Storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },

    /// The underlying store reported an error
    #[error("Storage {operation} failed for '{key}': {details}")]
    Backend {
        operation: &'static str,
        key: String,
        details: String,
    },
}

impl StorageError {
    /// Create an error from a backend failure message
    ///
    /// Classifies quota failures based on the message text, since browsers
    /// report them as generic exceptions.
    pub fn from_backend(operation: &'static str, key: &str, details: impl Into<String>) -> Self {
        let details = details.into();
        if is_quota_error(&details) {
            return StorageError::QuotaExceeded {
                key: key.to_string(),
            };
        }
        StorageError::Backend {
            operation,
            key: key.to_string(),
            details,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::QuotaExceeded { .. } => {
                Some("Clear site data for this library and reload the page.")
            }
            StorageError::Unavailable(_) => {
                Some("Enable cookies and site storage for this library to keep reading state.")
            }
            StorageError::Backend { .. } => None,
        }
    }

    /// Log a failure that is being swallowed, with its recovery suggestion
    pub fn log_failure(&self, action: &str) {
        warn!("{}", self.failure_message(action));
    }

    fn failure_message(&self, action: &str) -> String {
        match self.recovery_suggestion() {
            Some(suggestion) => format!("{}: {}. {}", action, self, suggestion),
            None => format!("{}: {}", action, self),
        }
    }
}

fn is_quota_error(details: &str) -> bool {
    let msg = details.to_lowercase();
    msg.contains("quota") || msg.contains("ns_error_dom_quota_reached")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
