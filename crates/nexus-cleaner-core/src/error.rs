//! Error types for retention policy handling.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or validating a retention policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The retention policy is not acceptable.
    #[error("Invalid retention policy: {reason}")]
    InvalidPolicy {
        /// Reason the policy was rejected.
        reason: String,
    },
}
