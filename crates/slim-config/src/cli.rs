//! Command-line surface of the server.

use std::path::PathBuf;

use clap::Parser;
use slim_protocol::Encoding;

use crate::logging::LogFormat;

/// Command-line interface accepted by `slimd`.
///
/// Driving harnesses append the port as the last argument, so a trailing
/// `PORT` is accepted alongside `--port`.
#[derive(Parser, Debug)]
#[command(name = "slimd", version, about = "Slim test-execution protocol server")]
pub(crate) struct Cli {
    /// Port to listen on.
    #[arg(short = 'p', long, value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Address to bind.
    #[arg(long, value_name = "HOST")]
    pub(crate) inethost: Option<String>,
    /// Byte encoding of message payloads.
    #[arg(long, value_name = "NAME")]
    pub(crate) encoding: Option<Encoding>,
    /// Enables debug logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
    /// Keeps serving connections after a session ends.
    #[arg(long)]
    pub(crate) keepalive: bool,
    /// File holding a log filter directive.
    #[arg(long, value_name = "FILE")]
    pub(crate) logconf: Option<PathBuf>,
    /// Fixture search paths, separated by commas or the platform path-list
    /// separator. May be repeated.
    #[arg(long, value_name = "PATHS")]
    pub(crate) syspath: Vec<String>,
    /// Log output format.
    #[arg(long, value_name = "FORMAT")]
    pub(crate) log_format: Option<LogFormat>,
    /// Largest accepted message payload, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub(crate) max_message_bytes: Option<usize>,
    /// Port to listen on, as appended by the harness. Wins over `--port`.
    #[arg(value_name = "PORT")]
    pub(crate) trailing_port: Option<u16>,
}
