//! Download handler (server role).
//!
//! Sends the size field, the file content in [`CHUNK_SIZE`] chunks, and
//! the CRC-32 trailer of exactly the bytes that were sent. A source that
//! cannot be opened is announced with a zero size and nothing else.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use filedrop_protocol::wire::{
    chunk_len, with_timeout, write_checksum, write_exact, write_size,
};
use filedrop_protocol::{CHUNK_SIZE, Crc32, WireError};

use crate::ServerError;

/// Result of a completed download exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Source could not be opened; the zero-size sentinel was sent.
    Unavailable,
    /// Whole file sent, followed by its checksum.
    Sent { bytes: u64, checksum: u32 },
}

/// Streams `source` to `stream` as one transfer frame.
pub async fn send_file<S: AsyncWrite + Unpin>(
    stream: &mut S,
    source: &Path,
    io_timeout: Option<Duration>,
) -> Result<DownloadOutcome, ServerError> {
    let opened = match tokio::fs::File::open(source).await {
        Ok(file) => match file.metadata().await {
            Ok(meta) if meta.is_file() => Some((file, meta.len())),
            Ok(_) => {
                warn!(path = %source.display(), "download source is not a regular file");
                None
            }
            Err(e) => {
                warn!(path = %source.display(), "cannot stat download source: {e}");
                None
            }
        },
        Err(e) => {
            warn!(path = %source.display(), "cannot open download source: {e}");
            None
        }
    };

    // A zero-length source cannot be told apart from a missing one on
    // the wire, so it gets the sentinel too.
    let (mut file, declared) = match opened {
        Some((file, len)) if len > 0 => (file, len),
        other => {
            if other.is_some() {
                debug!(path = %source.display(), "download source is empty");
            }
            with_timeout(io_timeout, async {
                write_size(stream, 0).await?;
                stream.flush().await?;
                Ok::<(), WireError>(())
            })
            .await?;
            return Ok(DownloadOutcome::Unavailable);
        }
    };

    with_timeout(io_timeout, write_size(stream, declared)).await?;

    let mut crc = Crc32::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;

    while sent < declared {
        let to_read = chunk_len(declared - sent);
        let n = file.read(&mut buf[..to_read]).await?;
        if n == 0 {
            return Err(ServerError::SourceTruncated { sent, declared });
        }

        with_timeout(io_timeout, write_exact(stream, &buf[..n])).await?;
        crc.update(&buf[..n]);
        sent += n as u64;
    }

    let checksum = crc.finalize();
    with_timeout(io_timeout, async {
        write_checksum(stream, checksum).await?;
        stream.flush().await?;
        Ok::<(), WireError>(())
    })
    .await?;

    info!(bytes = sent, checksum, "download sent");
    Ok(DownloadOutcome::Sent {
        bytes: sent,
        checksum,
    })
}
