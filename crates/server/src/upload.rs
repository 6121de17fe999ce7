//! Upload handler (server role).
//!
//! Reads the size field, then exactly that many payload bytes, writing
//! them to the sink and folding them into the checksum as they arrive.
//! The trailer sent back is computed from what was received; the client
//! never asserts a checksum of its own.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use filedrop_protocol::wire::{chunk_len, read_size, with_timeout, write_checksum};
use filedrop_protocol::{CHUNK_SIZE, Crc32, WireError};

use crate::ServerError;

/// Result of a completed upload exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub bytes: u64,
    pub checksum: u32,
    /// False when the sink could not be written; the payload was still
    /// drained and checksummed.
    pub stored: bool,
}

/// Receives one transfer frame from `stream` into `sink` and answers
/// with the checksum trailer.
///
/// Sink failures do not abort the exchange: the rest of the payload is
/// still drained so the stream stays aligned on frame boundaries.
pub async fn receive_file<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    sink: &Path,
    io_timeout: Option<Duration>,
) -> Result<UploadOutcome, ServerError> {
    let declared = with_timeout(io_timeout, read_size(stream)).await?;

    let mut file = match tokio::fs::File::create(sink).await {
        Ok(f) => Some(f),
        Err(e) => {
            error!(path = %sink.display(), "cannot create upload sink: {e}");
            None
        }
    };

    let mut crc = Crc32::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut received: u64 = 0;

    while received < declared {
        let to_read = chunk_len(declared - received);
        let n = with_timeout(io_timeout, async {
            let n = stream.read(&mut buf[..to_read]).await?;
            Ok::<usize, WireError>(n)
        })
        .await?;
        if n == 0 {
            return Err(WireError::Disconnected.into());
        }

        let write_error = match file.as_mut() {
            Some(f) => f.write_all(&buf[..n]).await.err(),
            None => None,
        };
        if let Some(e) = write_error {
            error!(path = %sink.display(), "upload sink write failed: {e}");
            file = None;
        }

        crc.update(&buf[..n]);
        received += n as u64;
    }

    let stored = match file.as_mut() {
        Some(f) => match f.flush().await {
            Ok(()) => true,
            Err(e) => {
                error!(path = %sink.display(), "upload sink flush failed: {e}");
                false
            }
        },
        None => false,
    };

    let checksum = crc.finalize();
    with_timeout(io_timeout, async {
        write_checksum(stream, checksum).await?;
        stream.flush().await?;
        Ok::<(), WireError>(())
    })
    .await?;

    info!(bytes = received, checksum, stored, "upload received");
    Ok(UploadOutcome {
        bytes: received,
        checksum,
        stored,
    })
}
