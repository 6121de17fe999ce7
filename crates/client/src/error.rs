//! Error types for the transfer client.

use filedrop_protocol::WireError;

/// Errors produced by the transfer client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("connection timed out")]
    Timeout,

    #[error("server sent an invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("local file ended after {sent} of {declared} bytes")]
    SourceTruncated { sent: u64, declared: u64 },

    #[error("reading local file failed after {sent} of {declared} bytes")]
    SourceRead {
        sent: u64,
        declared: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Returns `true` if the connection can no longer be used.
    ///
    /// Local file errors raised before a frame starts, or while the
    /// payload is being drained, leave the stream aligned and usable.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            ClientError::Io(_) => false,
            ClientError::Wire(_)
            | ClientError::Timeout
            | ClientError::InvalidSessionId(_)
            | ClientError::SourceTruncated { .. }
            | ClientError::SourceRead { .. } => true,
        }
    }
}
