//! filedrop transfer server entry point.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use filedrop_server::TransferServer;
use tracing_subscriber::EnvFilter;

/// Serves one download source and one upload sink over TCP.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:54000
    #[arg(short, long)]
    bind: Option<String>,

    /// File served to downloading clients
    #[arg(long)]
    source: Option<PathBuf>,

    /// File written by uploading clients
    #[arg(long)]
    sink: Option<PathBuf>,

    /// Maximum concurrent sessions (0 = unbounded)
    #[arg(long)]
    max_sessions: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting filedropd");

    let overrides = config::Overrides {
        bind: args.bind,
        source_path: args.source,
        sink_path: args.sink,
        max_sessions: args.max_sessions,
    };
    let config = config::load(args.config.as_deref(), overrides)?;
    tracing::info!(
        bind = %config.bind,
        source = %config.source_path.display(),
        sink = %config.sink_path.display(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(TransferServer::new(config)))?;

    tracing::info!("server shut down cleanly");
    Ok(())
}

/// Runs the server until it fails or Ctrl-C is pressed.
async fn run(server: Arc<TransferServer>) -> anyhow::Result<()> {
    let server_run = Arc::clone(&server);
    let mut task = tokio::spawn(async move { server_run.run().await });

    tokio::select! {
        result = &mut task => {
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutdown requested");
        }
    }

    server.shutdown();
    task.await??;
    Ok(())
}
