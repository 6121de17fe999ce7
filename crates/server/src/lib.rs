//! TCP transfer server.
//!
//! Accepts connections, gives each one a session id, and serves the
//! download (`'D'`) and upload (`'U'`) commands until the peer quits or
//! disconnects. Every session runs in its own task and shares nothing
//! with the others.

mod config;
mod download;
mod listener;
mod session;
mod upload;

pub use config::{ServerConfig, TransferConfig};
pub use download::{DownloadOutcome, send_file};
pub use listener::TransferServer;
pub use session::{Session, SessionEnd};
pub use upload::{UploadOutcome, receive_file};

use filedrop_protocol::WireError;

/// Errors produced by the transfer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("source file ended after {sent} of {declared} bytes")]
    SourceTruncated { sent: u64, declared: u64 },
}

impl ServerError {
    /// Returns `true` if the error means the peer went away.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ServerError::Wire(e) if e.is_disconnect())
    }
}
