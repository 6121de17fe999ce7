//! Wire protocol for filedrop transfers.
//!
//! Everything both peers must agree on lives here: the CRC-32 engine used
//! for payload integrity, the byte layout of frames and handshakes, the
//! command bytes, and the session identifier format.
//!
//! # Wire format
//!
//! See the [`wire`] module for the byte layout of every frame.

pub mod command;
pub mod crc32;
pub mod error;
pub mod session_id;
pub mod wire;

pub use command::Command;
pub use crc32::{Crc32, checksum};
pub use error::WireError;
pub use session_id::SessionId;

/// Size of the buffer used to stream payloads in both directions.
pub const CHUNK_SIZE: usize = 4096;

/// Default TCP port of the transfer server.
pub const DEFAULT_PORT: u16 = 54000;

/// Upper bound accepted for the session id length prefix.
pub const MAX_SESSION_ID_LEN: u32 = 64;
