//! Error types for the expenses CLI.
//!
//! Most of the crate passes `anyhow::Error` around with context attached. The typed errors in this
//! module are the ones a caller may want to match on, they are reachable through
//! `anyhow::Error::downcast_ref`.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error as ThisError;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the store adapter.
#[derive(Debug, ThisError)]
pub enum StoreError {
    /// The database could not be reached or refused the operation. Nothing was written.
    #[error("The expense store is unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// The targeted expense no longer exists.
    #[error("Expense not found: '{0}'")]
    NotFound(String),
}

/// A record that cannot take part in month-based computations.
#[derive(Debug, Clone, Eq, PartialEq, ThisError)]
#[error("Malformed expense record '{id}': {reason}")]
pub struct MalformedRecord {
    pub id: String,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// The notification channel did not accept a message.
#[derive(Debug, ThisError)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationDeliveryError(pub String);

/// Categorizes an error for the person running the command.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The data directory or configuration file is missing or invalid.
    Config,
    /// The expense store failed.
    Database,
    /// Writing the export file failed.
    Export,
    /// The request itself was invalid, e.g. a bad id.
    Request,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// Attaches an `ErrorType` to a failed result before it leaves a command handler.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let e: Error = e.into();
            e.context(format!("{error_type} error"))
        })
    }
}

/// Returns `true` if `e`, or anything in its chain, is `StoreError::NotFound`.
pub fn is_not_found(e: &Error) -> bool {
    e.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound(_))
        )
    })
}
