//! Connection listener.
//!
//! Accepts TCP connections and runs one [`Session`] task per connection.
//! Sessions are tracked in a [`JoinSet`] so shutdown can wait for them,
//! and an optional semaphore caps how many run at once.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::net::TcpListener;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ServerConfig, TransferConfig};
use crate::session::{Session, SessionEnd};
use crate::ServerError;

type SessionResult = (SocketAddr, Result<SessionEnd, ServerError>);

/// The transfer server.
pub struct TransferServer {
    config: ServerConfig,
    transfer: Arc<TransferConfig>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    active: Arc<AtomicUsize>,
}

impl TransferServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let transfer = Arc::new(config.transfer());
        Arc::new(Self {
            config,
            transfer,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Number of sessions currently running.
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Stops accepting and asks every session to finish.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until [`shutdown`](Self::shutdown).
    ///
    /// The listening socket is bound on entry and closed before this
    /// returns; live sessions get `shutdown_grace` to finish and are
    /// aborted after that.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind.as_str()).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!("transfer server listening on {local_addr}");

        let limit = (self.config.max_sessions > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_sessions)));
        let mut sessions: JoinSet<SessionResult> = JoinSet::new();
        let mut slot: Option<OwnedSemaphorePermit> = None;

        loop {
            // Reserve a session slot before accepting the next client.
            if slot.is_none() {
                if let Some(sem) = &limit {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        Some(res) = sessions.join_next(), if !sessions.is_empty() => {
                            reap(res);
                            continue;
                        }
                        permit = Arc::clone(sem).acquire_owned() => match permit {
                            Ok(p) => slot = Some(p),
                            Err(_) => break,
                        },
                    }
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(res) = sessions.join_next(), if !sessions.is_empty() => reap(res),
                result = listener.accept() => match result {
                    Ok((stream, peer_addr)) => {
                        self.spawn_session(&mut sessions, stream, peer_addr, slot.take());
                    }
                    Err(e) => {
                        error!("accept error: {e}");
                    }
                },
            }
        }

        drop(listener);
        *self.local_addr.lock().await = None;
        info!("listener closed");

        self.drain(sessions).await;
        info!("transfer server stopped");
        Ok(())
    }

    fn spawn_session(
        &self,
        sessions: &mut JoinSet<SessionResult>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer_addr, "set_nodelay failed: {e}");
        }

        let session = Session::new(stream, Arc::clone(&self.transfer), self.cancel.child_token());
        info!(%peer_addr, session = %session.id(), "client connected");

        let guard = ActiveGuard::new(Arc::clone(&self.active));
        sessions.spawn(async move {
            let _permit = permit;
            let _guard = guard;
            (peer_addr, session.run().await)
        });
    }

    async fn drain(&self, mut sessions: JoinSet<SessionResult>) {
        if sessions.is_empty() {
            return;
        }

        info!(count = sessions.len(), "waiting for sessions to finish");
        let grace = self.config.shutdown_grace();
        let finished = tokio::time::timeout(grace, async {
            while let Some(res) = sessions.join_next().await {
                reap(res);
            }
        })
        .await;

        if finished.is_err() {
            warn!(remaining = sessions.len(), "aborting sessions after shutdown grace");
            sessions.shutdown().await;
        }
    }
}

/// Logs the end of a finished session task.
fn reap(res: Result<SessionResult, JoinError>) {
    match res {
        Ok((peer_addr, Ok(end))) => debug!(%peer_addr, ?end, "session finished"),
        Ok((peer_addr, Err(e))) => debug!(%peer_addr, "session failed: {e}"),
        Err(e) if e.is_cancelled() => debug!("session task aborted"),
        Err(e) => error!("session task panicked: {e}"),
    }
}

/// Keeps the live-session counter accurate even when a task is aborted.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
