//! Client side of the filedrop protocol.
//!
//! Connects to a transfer server, receives the session id, and runs the
//! client role of the download and upload exchanges. Each side computes
//! its own CRC-32 of the payload; a disagreement is reported in the
//! returned [`TransferReport`], never retried.

mod client;
mod error;
mod types;

pub use client::Client;
pub use error::ClientError;
pub use types::{ClientOptions, DownloadResult, TransferReport};
