//! Error types for staffsync-sheets.

use thiserror::Error;

/// Failures reading or writing the grid surface.
///
/// Writes are not atomic: a failed write may have updated some cells.
#[derive(Debug, Error)]
pub enum GridError {
    /// The Sheets API answered with a non-success status.
    #[error("sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Network-level failure before a response was received.
    #[error("sheets transport error: {0}")]
    Transport(String),

    /// Access token could not be minted or exchanged.
    #[error("sheets authentication failed: {0}")]
    Auth(String),

    /// A response body did not have the expected shape.
    #[error("unexpected sheets response: {0}")]
    Decode(String),

    /// Values do not fit the addressed range.
    #[error("range {range} cannot hold the supplied values: {reason}")]
    OutOfRange { range: String, reason: String },

    /// The backing surface is unreachable (in-memory fault injection).
    #[error("grid surface unavailable: {0}")]
    Unavailable(String),
}

impl From<ureq::Error> for GridError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => GridError::Api {
                status,
                message: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => GridError::Transport(transport.to_string()),
        }
    }
}
