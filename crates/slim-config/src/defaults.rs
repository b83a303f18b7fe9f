//! Built-in configuration values.

use crate::logging::LogFormat;

/// Port the server listens on when neither `--port` nor a positional port is
/// given.
pub const DEFAULT_PORT: u16 = 8989;

/// Bind address used when `--inethost` is absent.
pub const DEFAULT_HOST: &str = "localhost";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log filter selected by `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "debug";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default upper bound on a single message payload.
#[must_use]
pub const fn default_max_message_bytes() -> usize {
    slim_protocol::DEFAULT_MAX_MESSAGE_BYTES
}
