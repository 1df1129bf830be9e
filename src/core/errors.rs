/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason carried by a cancelled [`Context`](crate::core::context::Context)
///
/// Blocking operations return it verbatim when their context fires.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Diagnostic)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    #[error("context cancelled")]
    #[diagnostic(
        code(context::cancelled),
        help("The caller cancelled the operation explicitly.")
    )]
    Cancelled,

    #[error("context deadline exceeded")]
    #[diagnostic(
        code(context::deadline_exceeded),
        help("The operation did not complete before the context deadline. Consider a longer timeout.")
    )]
    DeadlineExceeded,
}

impl CancelReason {
    /// True for deadline-driven cancellation
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CancelReason::DeadlineExceeded)
    }
}

/// Queue errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum QueueError {
    #[error("queue is empty")]
    #[diagnostic(
        code(queue::empty),
        help("Nothing to dequeue right now. Use the blocking variant to wait for an element.")
    )]
    EmptyQueue,

    #[error("queue is out of capacity")]
    #[diagnostic(
        code(queue::out_of_capacity),
        help("The bounded queue is full. Use the blocking variant or dequeue first.")
    )]
    OutOfCapacity,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cancelled(#[from] CancelReason),
}

impl QueueError {
    /// Cancellation reason, if this error came from the caller's context
    #[inline]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            QueueError::Cancelled(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Check the environment variable or JSON field for a typo.")
    )]
    InvalidValue { key: String, value: String },

    #[error("{key} must be greater than zero")]
    #[diagnostic(code(config::zero), help("Segment and pool sizes must be at least 1."))]
    Zero { key: String },

    #[error("malformed configuration: {0}")]
    #[diagnostic(code(config::malformed))]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err.to_string())
    }
}
