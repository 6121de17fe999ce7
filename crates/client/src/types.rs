use std::time::Duration;

/// Client timeouts.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Deadline for establishing the TCP connection.
    pub connect_timeout: Option<Duration>,
    /// Deadline for each read/write once connected.
    pub io_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            io_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Checksums seen by both peers for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Payload bytes moved.
    pub bytes: u64,
    /// CRC-32 computed locally over the payload.
    pub local_checksum: u32,
    /// CRC-32 reported by the server in its trailer.
    pub remote_checksum: u32,
}

impl TransferReport {
    /// Both sides agree on the payload.
    pub fn verified(&self) -> bool {
        self.local_checksum == self.remote_checksum
    }
}

/// Outcome of a download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadResult {
    /// The server announced size 0: nothing to fetch.
    Unavailable,
    Received(TransferReport),
}
