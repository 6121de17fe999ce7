//! Transfer client.
//!
//! Mirrors the server handlers: a download reads the size field and, when
//! it is non-zero, the payload and trailer; an upload sends the size field
//! and payload, then reads the server's trailer. Both sides checksum the
//! payload independently.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, warn};

use filedrop_protocol::wire::{
    chunk_len, read_checksum, read_session_id, read_size, with_timeout, write_command,
    write_exact, write_size,
};
use filedrop_protocol::{CHUNK_SIZE, Command, Crc32, SessionId, WireError};

use crate::error::ClientError;
use crate::types::{ClientOptions, DownloadResult, TransferReport};

/// A connected client session.
pub struct Client<S = TcpStream> {
    stream: S,
    session_id: SessionId,
    options: ClientOptions,
}

impl Client<TcpStream> {
    /// Connects to a server and performs the handshake.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let connect = TcpStream::connect(addr);
        let stream = match options.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| ClientError::Timeout)??,
            None => connect.await?,
        };
        stream.set_nodelay(true)?;

        if let Ok(peer) = stream.peer_addr() {
            info!(%peer, "connected");
        }
        Self::handshake(stream, options).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    /// Reads the session id the server sends on every new connection.
    pub async fn handshake(mut stream: S, options: ClientOptions) -> Result<Self, ClientError> {
        let raw = with_timeout(options.io_timeout, read_session_id(&mut stream)).await?;
        let session_id = SessionId::parse(&raw).ok_or(ClientError::InvalidSessionId(raw))?;
        info!(session = %session_id, "session established");

        Ok(Self {
            stream,
            session_id,
            options,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Sends a single command byte without running an exchange.
    pub async fn send_command(&mut self, command: Command) -> Result<(), ClientError> {
        with_timeout(
            self.options.io_timeout,
            write_command(&mut self.stream, command),
        )
        .await?;
        Ok(())
    }

    /// Downloads the server's file into `dest`.
    ///
    /// `dest` is only created once the server announces a non-zero size.
    /// If it cannot be written, the payload and trailer are still consumed
    /// so the connection stays usable, and the write error is returned.
    pub async fn download(&mut self, dest: &Path) -> Result<DownloadResult, ClientError> {
        let io_timeout = self.options.io_timeout;
        let stream = &mut self.stream;

        with_timeout(io_timeout, write_command(stream, Command::Download)).await?;
        let declared = with_timeout(io_timeout, read_size(stream)).await?;
        if declared == 0 {
            warn!("file not available on server");
            return Ok(DownloadResult::Unavailable);
        }
        info!(bytes = declared, "downloading");

        let mut sink_error = None;
        let mut file = match File::create(dest).await {
            Ok(f) => Some(f),
            Err(e) => {
                sink_error = Some(e);
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
                sink_error = Some(e);
                file = None;
            }

            crc.update(&buf[..n]);
            received += n as u64;
        }

        if let Some(f) = file.as_mut() {
            if let Err(e) = f.flush().await {
                sink_error = Some(e);
            }
        }

        let remote_checksum = with_timeout(io_timeout, read_checksum(stream)).await?;
        let report = TransferReport {
            bytes: received,
            local_checksum: crc.finalize(),
            remote_checksum,
        };
        log_report("download", &report);

        if let Some(e) = sink_error {
            error!(path = %dest.display(), "cannot write downloaded file: {e}");
            return Err(e.into());
        }
        Ok(DownloadResult::Received(report))
    }

    /// Uploads `src` to the server.
    ///
    /// The local file is opened before anything is sent, so a missing
    /// file leaves the connection untouched.
    pub async fn upload(&mut self, src: &Path) -> Result<TransferReport, ClientError> {
        let io_timeout = self.options.io_timeout;
        let stream = &mut self.stream;

        let mut file = File::open(src).await?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", src.display()),
            )
            .into());
        }
        let declared = meta.len();
        info!(bytes = declared, path = %src.display(), "uploading");

        with_timeout(io_timeout, async {
            write_command(stream, Command::Upload).await?;
            write_size(stream, declared).await
        })
        .await?;

        let mut crc = Crc32::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut sent: u64 = 0;

        while sent < declared {
            let to_read = chunk_len(declared - sent);
            // Once the size field is out, a local read error cannot be
            // reported in-band; the frame is short either way.
            let n = match file.read(&mut buf[..to_read]).await {
                Ok(n) => n,
                Err(source) => {
                    error!(path = %src.display(), "cannot read upload source: {source}");
                    return Err(ClientError::SourceRead {
                        sent,
                        declared,
                        source,
                    });
                }
            };
            if n == 0 {
                return Err(ClientError::SourceTruncated { sent, declared });
            }

            with_timeout(io_timeout, write_exact(stream, &buf[..n])).await?;
            crc.update(&buf[..n]);
            sent += n as u64;
        }

        let remote_checksum = with_timeout(io_timeout, async {
            stream.flush().await?;
            read_checksum(stream).await
        })
        .await?;

        let report = TransferReport {
            bytes: sent,
            local_checksum: crc.finalize(),
            remote_checksum,
        };
        log_report("upload", &report);
        Ok(report)
    }

    /// Sends `'Q'` and closes the connection.
    pub async fn quit(mut self) -> Result<(), ClientError> {
        self.send_command(Command::Quit).await?;
        if let Err(e) = self.stream.shutdown().await {
            debug!("connection shutdown: {e}");
        }
        info!(session = %self.session_id, "session closed");
        Ok(())
    }
}

fn log_report(direction: &str, report: &TransferReport) {
    if report.verified() {
        info!(
            direction,
            bytes = report.bytes,
            checksum = report.local_checksum,
            "integrity verified"
        );
    } else {
        warn!(
            direction,
            bytes = report.bytes,
            local = report.local_checksum,
            remote = report.remote_checksum,
            "integrity mismatch"
        );
    }
}
