//! Daemon configuration loading.
//!
//! Settings come from an optional TOML file, then command line flags
//! override individual fields.

use std::path::{Path, PathBuf};

use anyhow::Context;
use filedrop_server::ServerConfig;

/// Command line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub source_path: Option<PathBuf>,
    pub sink_path: Option<PathBuf>,
    pub max_sessions: Option<usize>,
}

impl Overrides {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(path) = self.source_path {
            config.source_path = path;
        }
        if let Some(path) = self.sink_path {
            config.sink_path = path;
        }
        if let Some(max) = self.max_sessions {
            config.max_sessions = max;
        }
    }
}

/// Loads the server configuration.
///
/// Without a file every field takes its default. A file that was asked
/// for explicitly must exist and parse.
pub fn load(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: ServerConfig = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            tracing::debug!(path = %path.display(), "configuration file loaded");
            config
        }
        None => ServerConfig::default(),
    };

    overrides.apply(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load(None, Overrides::default()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:54000");
        assert_eq!(config.source_path, PathBuf::from("testfile.txt"));
        assert_eq!(config.sink_path, PathBuf::from("uploaded_from_client.txt"));
    }

    #[test]
    fn file_then_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("filedropd.toml");
        std::fs::write(
            &path,
            r#"
bind = "127.0.0.1:6000"
source_path = "/srv/out.bin"
io_timeout_secs = 5
"#,
        )
        .unwrap();

        let overrides = Overrides {
            bind: Some("127.0.0.1:7000".into()),
            sink_path: Some("/srv/in.bin".into()),
            ..Overrides::default()
        };
        let config = load(Some(&path), overrides).unwrap();

        assert_eq!(config.bind, "127.0.0.1:7000");
        assert_eq!(config.source_path, PathBuf::from("/srv/out.bin"));
        assert_eq!(config.sink_path, PathBuf::from("/srv/in.bin"));
        assert_eq!(config.io_timeout_secs, 5);
        assert_eq!(config.max_sessions, 1024);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.toml");
        let err = load(Some(&path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "max_sessions = \"many\"").unwrap();
        assert!(load(Some(&path), Overrides::default()).is_err());
    }
}
