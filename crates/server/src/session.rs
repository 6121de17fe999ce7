//! Per-connection session: handshake, command dispatch, teardown.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use filedrop_protocol::wire::{read_command, with_timeout, write_session_id};
use filedrop_protocol::{Command, SessionId, WireError};

use crate::config::TransferConfig;
use crate::download::send_file;
use crate::upload::receive_file;
use crate::ServerError;

/// Why a session ended without a transport or protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client sent `'Q'`.
    Quit,
    /// Client closed the connection, or a command read failed.
    Disconnected,
    /// Server shutdown was requested while waiting for a command.
    Cancelled,
    /// No command arrived within the idle timeout.
    IdleTimeout,
}

/// One client connection, owned from handshake to close.
pub struct Session<S> {
    id: SessionId,
    stream: S,
    config: Arc<TransferConfig>,
    cancel: CancellationToken,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Binds a fresh session id to `stream`.
    pub fn new(stream: S, config: Arc<TransferConfig>, cancel: CancellationToken) -> Self {
        Self {
            id: SessionId::generate(),
            stream,
            config,
            cancel,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Runs the session until quit, disconnect, cancellation or failure.
    ///
    /// The connection is shut down on every exit path.
    pub async fn run(self) -> Result<SessionEnd, ServerError> {
        let span = info_span!("session", id = %self.id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> Result<SessionEnd, ServerError> {
        let result = self.serve().await;

        if let Err(e) = self.stream.shutdown().await {
            debug!("connection shutdown: {e}");
        }

        match &result {
            Ok(end) => info!(?end, "connection closed"),
            Err(e) => warn!("connection closed after error: {e}"),
        }
        result
    }

    async fn serve(&mut self) -> Result<SessionEnd, ServerError> {
        let io_timeout = self.config.io_timeout;
        let idle_timeout = self.config.idle_timeout;
        let cancel = self.cancel.clone();

        with_timeout(io_timeout, write_session_id(&mut self.stream, &self.id)).await?;
        info!("session id assigned");

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("server shutting down");
                    return Ok(SessionEnd::Cancelled);
                }
                read = with_timeout(idle_timeout, read_command(&mut self.stream)) => read,
            };

            let command = match read {
                Ok(Some(command)) => command,
                Ok(None) => {
                    info!("client disconnected");
                    return Ok(SessionEnd::Disconnected);
                }
                Err(WireError::Timeout) => {
                    info!("client idle, closing");
                    return Ok(SessionEnd::IdleTimeout);
                }
                Err(e) => {
                    info!("client disconnected: {e}");
                    return Ok(SessionEnd::Disconnected);
                }
            };

            match command {
                Command::Download => {
                    info!("download request received");
                    send_file(&mut self.stream, &self.config.source_path, io_timeout).await?;
                }
                Command::Upload => {
                    info!("upload request received");
                    receive_file(&mut self.stream, &self.config.sink_path, io_timeout).await?;
                }
                Command::Quit => {
                    info!("client requested quit");
                    return Ok(SessionEnd::Quit);
                }
                Command::Unknown(byte) => {
                    warn!(byte, "unknown command");
                }
            }
        }
    }
}
