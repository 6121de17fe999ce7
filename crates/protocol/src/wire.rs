//! TCP wire format for file transfers.
//!
//! # Wire format
//!
//! ```text
//! HANDSHAKE (Server -> Client), once per connection:
//!   [4 bytes LE: id_len]
//!   [id_len bytes: session id ASCII]
//!
//! COMMAND (Client -> Server): [1 byte: 'D' | 'U' | 'Q' | other]
//!
//! 'D' (Server -> Client):
//!   [8 bytes LE: file_size]            0 = unavailable, nothing follows
//!   [file_size bytes: raw file data]
//!   [4 bytes LE: crc32 of file data]
//!
//! 'U' (Client -> Server):
//!   [8 bytes LE: file_size]
//!   [file_size bytes: raw file data]
//! 'U' (Server -> Client):
//!   [4 bytes LE: crc32 of received data]
//! ```
//!
//! All integers are little-endian. The checksum never covers the size
//! field.
//!
//! Reads and writes go through [`read_exact`] and [`write_exact`], which
//! wrap tokio's `read_exact`/`write_all` and report a zero-length
//! transfer as the peer going away. They make no assumption about how
//! the transport fragments the stream.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::command::Command;
use crate::error::WireError;
use crate::session_id::SessionId;
use crate::{CHUNK_SIZE, MAX_SESSION_ID_LEN};

/// Length of the size field that opens every transfer frame.
pub const SIZE_FIELD_LEN: usize = 8;

/// Length of the checksum trailer.
pub const CHECKSUM_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Exact-count primitives
// ---------------------------------------------------------------------------

/// Writes every byte of `bytes`, retrying partial writes.
pub async fn write_exact<W: AsyncWrite + Unpin>(
    writer: &mut W,
    bytes: &[u8],
) -> Result<(), WireError> {
    writer.write_all(bytes).await.map_err(short_transfer)
}

/// Fills `buf` completely, retrying partial reads.
///
/// A zero-length read before `buf` is full means the peer closed the
/// stream mid-frame.
pub async fn read_exact<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), WireError> {
    reader.read_exact(buf).await.map_err(short_transfer)?;
    Ok(())
}

/// Maps tokio's zero-length transfer errors to [`WireError::Disconnected`].
fn short_transfer(e: io::Error) -> WireError {
    match e.kind() {
        io::ErrorKind::WriteZero | io::ErrorKind::UnexpectedEof => WireError::Disconnected,
        _ => WireError::Io(e),
    }
}

/// Size of the next payload chunk when `remaining` bytes are still due.
///
/// The minimum is taken in `u64` so large remainders never wrap on
/// 32-bit targets.
pub fn chunk_len(remaining: u64) -> usize {
    remaining.min(CHUNK_SIZE as u64) as usize
}

/// Runs `fut` with an optional deadline.
pub async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T, WireError>
where
    F: Future<Output = Result<T, WireError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| WireError::Timeout)?,
        None => fut.await,
    }
}

// ---------------------------------------------------------------------------
// Frame fields
// ---------------------------------------------------------------------------

/// Writes the 8-byte size field.
pub async fn write_size<W: AsyncWrite + Unpin>(writer: &mut W, size: u64) -> Result<(), WireError> {
    write_exact(writer, &size.to_le_bytes()).await
}

/// Reads the 8-byte size field.
pub async fn read_size<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u64, WireError> {
    let mut buf = [0u8; SIZE_FIELD_LEN];
    read_exact(reader, &mut buf).await?;
    Ok(u64::from_le_bytes(buf))
}

/// Writes the 4-byte checksum trailer.
pub async fn write_checksum<W: AsyncWrite + Unpin>(
    writer: &mut W,
    checksum: u32,
) -> Result<(), WireError> {
    write_exact(writer, &checksum.to_le_bytes()).await
}

/// Reads the 4-byte checksum trailer.
pub async fn read_checksum<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32, WireError> {
    let mut buf = [0u8; CHECKSUM_LEN];
    read_exact(reader, &mut buf).await?;
    Ok(u32::from_le_bytes(buf))
}

// ---------------------------------------------------------------------------
// Handshake and commands
// ---------------------------------------------------------------------------

/// Writes the session handshake (length prefix + id bytes) and flushes.
pub async fn write_session_id<W: AsyncWrite + Unpin>(
    writer: &mut W,
    id: &SessionId,
) -> Result<(), WireError> {
    let bytes = id.as_str().as_bytes();
    let len = u32::try_from(bytes.len())
        .map_err(|_| WireError::Protocol(format!("session id too long: {} bytes", bytes.len())))?;
    write_exact(writer, &len.to_le_bytes()).await?;
    write_exact(writer, bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the session handshake sent by the server.
///
/// The id is returned as sent; callers decide whether to validate it.
pub async fn read_session_id<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, WireError> {
    let mut len_buf = [0u8; 4];
    read_exact(reader, &mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf);
    if len > MAX_SESSION_ID_LEN {
        return Err(WireError::Protocol(format!(
            "session id length {len} exceeds {MAX_SESSION_ID_LEN}"
        )));
    }

    let mut buf = vec![0u8; len as usize];
    read_exact(reader, &mut buf).await?;
    String::from_utf8(buf)
        .map_err(|e| WireError::Protocol(format!("invalid session id encoding: {e}")))
}

/// Writes one command byte and flushes.
pub async fn write_command<W: AsyncWrite + Unpin>(
    writer: &mut W,
    command: Command,
) -> Result<(), WireError> {
    write_exact(writer, &[command.as_byte()]).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one command byte.
///
/// Returns `None` if the peer closed the stream cleanly.
pub async fn read_command<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Command>, WireError> {
    let mut buf = [0u8; 1];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(Command::from_byte(buf[0])))
}
