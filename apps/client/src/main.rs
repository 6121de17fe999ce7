//! Interactive filedrop client.
//!
//! Connects once, then reads one command per line from stdin until `Q`
//! or end of input.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use filedrop_client::{Client, ClientOptions, DownloadResult, TransferReport};
use filedrop_protocol::{Command, DEFAULT_PORT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "Enter command (D=Download, U=Upload, Q=Quit): ";

/// Downloads from and uploads to a filedrop server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server address
    #[arg(short, long, default_value_t = format!("127.0.0.1:{DEFAULT_PORT}"))]
    server: String,

    /// Where downloads are written
    #[arg(long, default_value = "received.txt")]
    download_to: PathBuf,

    /// File sent by uploads
    #[arg(long, default_value = "upload.txt")]
    upload_from: PathBuf,

    /// Per-operation timeout in seconds (0 = none)
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let io_timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let options = ClientOptions {
        io_timeout,
        ..ClientOptions::default()
    };

    let mut client = Client::connect(args.server.as_str(), options)
        .await
        .with_context(|| format!("connecting to {}", args.server))?;
    println!("Connected. Session: {}", client.session_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // End of input behaves like Q.
            println!();
            break;
        };
        let Some(command) = parse_input(&line) else {
            continue;
        };

        let result = match command {
            Command::Download => client
                .download(&args.download_to)
                .await
                .map(|outcome| report_download(&outcome)),
            Command::Upload => client
                .upload(&args.upload_from)
                .await
                .map(|report| report_transfer("Upload", &report)),
            Command::Quit => break,
            Command::Unknown(_) => {
                let sent = client.send_command(command).await;
                println!("Unknown command.");
                sent
            }
        };

        if let Err(e) = result {
            eprintln!("Error: {e}");
            if e.is_connection_lost() {
                return Err(anyhow::Error::new(e).context("connection lost"));
            }
        }
    }

    client.quit().await?;
    Ok(())
}

/// Maps an input line to the command byte it sends.
///
/// Only the first non-blank character counts; letters are case-insensitive.
fn parse_input(line: &str) -> Option<Command> {
    let c = line.trim().chars().next()?;
    if !c.is_ascii() {
        return Some(Command::Unknown(b'?'));
    }
    Some(Command::from_byte(c.to_ascii_uppercase() as u8))
}

fn report_download(outcome: &DownloadResult) {
    match outcome {
        DownloadResult::Unavailable => println!("File not available."),
        DownloadResult::Received(report) => report_transfer("Download", report),
    }
}

fn report_transfer(label: &str, report: &TransferReport) {
    println!(
        "{label}: {} bytes, CRC computed={:08x} remote={:08x}",
        report.bytes, report.local_checksum, report.remote_checksum
    );
    if report.verified() {
        println!("Integrity verified.");
    } else {
        println!("Integrity mismatch!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("D"), Some(Command::Download));
        assert_eq!(parse_input("  u\n"), Some(Command::Upload));
        assert_eq!(parse_input("q"), Some(Command::Quit));
        assert_eq!(parse_input("download"), Some(Command::Download));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("   \n"), None);
    }

    #[test]
    fn other_input_is_unknown() {
        assert_eq!(parse_input("x"), Some(Command::Unknown(b'X')));
        assert_eq!(parse_input("7"), Some(Command::Unknown(b'7')));
        assert_eq!(parse_input("é"), Some(Command::Unknown(b'?')));
    }

    #[test]
    fn cli_defaults() {
        let args = Args::parse_from(["filedrop"]);
        assert_eq!(args.server, "127.0.0.1:54000");
        assert_eq!(args.download_to, PathBuf::from("received.txt"));
        assert_eq!(args.upload_from, PathBuf::from("upload.txt"));
        assert_eq!(args.timeout, 30);
    }
}
