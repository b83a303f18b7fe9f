//! Log output for the server.
//!
//! Everything is written to standard error. A harness that launches the
//! server as a child process may capture standard output as part of the
//! test run, so nothing diagnostic goes there.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use slim_config::{Config, LogFormat};

static INSTALLED: OnceCell<TelemetryHandle> = OnceCell::new();

/// Records how process-wide logging was set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Output format chosen by the first successful installation.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Failures while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter expression is not valid `RUST_LOG` syntax.
    #[error("invalid log filter {filter:?}: {message}")]
    InvalidFilter {
        /// Expression as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Something other than this module already owns the global subscriber.
    #[error("a global log subscriber is already installed: {0}")]
    AlreadyInstalled(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// The process keeps whatever the first call chose; a test binary that
/// bootstraps many servers gets the same handle back each time.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a filter that does not
/// parse and [`TelemetryError::AlreadyInstalled`] when another subscriber
/// got there first.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let filter = parse_filter(config.log_filter())?;
            let format = config.log_format();
            tracing::subscriber::set_global_default(subscriber_for(format, filter))
                .map_err(TelemetryError::AlreadyInstalled)?;
            Ok(TelemetryHandle { format })
        })
        .copied()
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::InvalidFilter {
        filter: expression.to_owned(),
        message: error.to_string(),
    })
}

/// Sessions run one per thread, so thread ids tell interleaved sessions
/// apart.
fn subscriber_for(format: LogFormat, filter: EnvFilter) -> Box<dyn Subscriber + Send + Sync> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());
    match format {
        LogFormat::Compact => Box::new(builder.compact().finish()),
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
    }
}
