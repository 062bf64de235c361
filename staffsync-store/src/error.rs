//! Error types for staffsync-store.

use thiserror::Error;

/// Failures reaching or using the record store. Work already applied before
/// the failure stays applied.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("record store returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Network-level failure before a response was received.
    #[error("record store transport error: {0}")]
    Transport(String),

    /// A response body did not have the expected shape.
    #[error("unexpected record store response: {0}")]
    Decode(String),

    /// A record with this email already exists.
    #[error("a record with email {email} already exists")]
    DuplicateEmail { email: String },

    /// The store is unreachable (in-memory fault injection).
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl From<ureq::Error> for StoreError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => StoreError::Api {
                status,
                message: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => StoreError::Transport(transport.to_string()),
        }
    }
}
