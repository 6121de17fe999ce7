//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use filedrop_protocol::DEFAULT_PORT;

/// Listener and session settings.
///
/// Deserializable from TOML; every field has a default so a partial
/// file is enough. Timeouts are in seconds, `0` disables them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:54000`.
    pub bind: String,

    /// File served by the download command.
    pub source_path: PathBuf,

    /// File written by the upload command.
    pub sink_path: PathBuf,

    /// Maximum number of live sessions (0 = unbounded).
    pub max_sessions: usize,

    /// Deadline for each read/write inside a transfer.
    pub io_timeout_secs: u64,

    /// Deadline for a client to send its next command.
    pub idle_timeout_secs: u64,

    /// How long shutdown waits for live sessions before aborting them.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            source_path: PathBuf::from("testfile.txt"),
            sink_path: PathBuf::from("uploaded_from_client.txt"),
            max_sessions: 1024,
            io_timeout_secs: 30,
            idle_timeout_secs: 0,
            shutdown_grace_secs: 5,
        }
    }
}

impl ServerConfig {
    /// Per-session settings shared by every handler.
    pub fn transfer(&self) -> TransferConfig {
        TransferConfig {
            source_path: self.source_path.clone(),
            sink_path: self.sink_path.clone(),
            io_timeout: secs(self.io_timeout_secs),
            idle_timeout: secs(self.idle_timeout_secs),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

/// Settings a session needs to run its handlers.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub source_path: PathBuf,
    pub sink_path: PathBuf,
    pub io_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:54000");
        assert_eq!(config.source_path, PathBuf::from("testfile.txt"));
        assert_eq!(config.sink_path, PathBuf::from("uploaded_from_client.txt"));
        assert_eq!(config.max_sessions, 1024);

        let transfer = config.transfer();
        assert_eq!(transfer.io_timeout, Some(Duration::from_secs(30)));
        assert_eq!(transfer.idle_timeout, None);
    }

    #[test]
    fn config_partial_toml() {
        let toml_str = r#"
            bind = "127.0.0.1:9000"
            source_path = "/srv/share/data.bin"
            io_timeout_secs = 0
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.source_path, PathBuf::from("/srv/share/data.bin"));
        assert_eq!(config.sink_path, PathBuf::from("uploaded_from_client.txt"));
        assert_eq!(config.transfer().io_timeout, None);
    }

    #[test]
    fn idle_timeout_enabled() {
        let config = ServerConfig {
            idle_timeout_secs: 120,
            ..ServerConfig::default()
        };
        assert_eq!(config.transfer().idle_timeout, Some(Duration::from_secs(120)));
    }
}
