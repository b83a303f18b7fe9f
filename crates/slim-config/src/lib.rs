//! Configuration for the Slim protocol server.
//!
//! The server is configured entirely from the command line. [`Config::load`]
//! parses the process arguments; [`Config::load_from_iter`] accepts an
//! explicit argument list so tests can exercise the same path.

mod cli;
pub mod defaults;
pub mod listen;
pub mod logging;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use slim_protocol::Encoding;
use thiserror::Error;

use self::cli::Cli;

pub use self::defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, VERBOSE_LOG_FILTER, default_log_filter,
    default_log_format, default_max_message_bytes,
};
pub use self::listen::ListenAddress;
pub use self::logging::{LogFormat, LogFormatParseError};

#[cfg(windows)]
const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: char = ':';

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The arguments were rejected, or help or version output was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    /// The `--logconf` file could not be read.
    #[error("failed to read log configuration '{path}': {source}")]
    LogConf {
        /// Path given to `--logconf`.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The `--logconf` file holds no filter directive.
    #[error("log configuration '{path}' contains no filter directive")]
    EmptyLogConf {
        /// Path given to `--logconf`.
        path: PathBuf,
    },
    /// `--max-message-bytes` was zero.
    #[error("maximum message size must be at least one byte")]
    ZeroMessageLimit,
}

/// Resolved server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Address the listener binds.
    pub listen: ListenAddress,
    /// Byte encoding of message payloads.
    pub encoding: Encoding,
    /// Whether the server keeps accepting connections after a session ends.
    pub keepalive: bool,
    /// Fixture search paths consulted before any session imports, in order.
    pub search_paths: Vec<String>,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Largest accepted message payload, in bytes.
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenAddress::default(),
            encoding: Encoding::default(),
            keepalive: false,
            search_paths: Vec::new(),
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the arguments are invalid or the log
    /// configuration file cannot be used.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list. The first item is
    /// the program name.
    ///
    /// # Errors
    ///
    /// As for [`Config::load`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Self::from_cli(cli)
    }

    fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let log_filter = match cli.logconf.as_deref() {
            Some(path) => read_log_filter(path)?,
            None if cli.verbose => VERBOSE_LOG_FILTER.to_owned(),
            None => default_log_filter().to_owned(),
        };
        let max_message_bytes = match cli.max_message_bytes {
            Some(0) => return Err(ConfigError::ZeroMessageLimit),
            Some(limit) => limit,
            None => default_max_message_bytes(),
        };
        let port = cli.trailing_port.or(cli.port).unwrap_or(DEFAULT_PORT);
        let host = cli.inethost.unwrap_or_else(|| DEFAULT_HOST.to_owned());

        Ok(Self {
            listen: ListenAddress::new(host, port),
            encoding: cli.encoding.unwrap_or_default(),
            keepalive: cli.keepalive,
            search_paths: split_search_paths(&cli.syspath),
            log_filter,
            log_format: cli.log_format.unwrap_or_else(default_log_format),
            max_message_bytes,
        })
    }

    /// Address the listener binds.
    #[must_use]
    pub const fn listen(&self) -> &ListenAddress {
        &self.listen
    }

    /// `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn split_search_paths(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split([',', PATH_LIST_SEPARATOR]))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reads the first directive from a log configuration file. Blank lines and
/// lines starting with `#` are skipped.
fn read_log_filter(path: &Path) -> Result<String, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::LogConf {
        path: path.to_path_buf(),
        source,
    })?;
    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .ok_or_else(|| ConfigError::EmptyLogConf {
            path: path.to_path_buf(),
        })
}
