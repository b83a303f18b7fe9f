//! Deciding when a keep-alive server stops accepting harnesses.

use std::ffi::c_int;
use std::fmt;
use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;

/// Signals that end a keep-alive server by default.
pub const TERMINATION_SIGNALS: [c_int; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Why the listener was told to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The process received this signal number.
    Signal(c_int),
    /// Code embedding the server asked it to stop.
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(number) => write!(f, "signal {number}"),
            Self::Requested => f.write_str("stop requested"),
        }
    }
}

/// Source of the stop request for a keep-alive server.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the server should stop.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the source cannot be watched.
    fn wait(&self) -> Result<StopReason, ShutdownError>;
}

/// Failures while waiting for a stop request.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("cannot watch for termination signals: {0}")]
    Install(#[source] io::Error),
    /// The signal stream ended without delivering anything.
    #[error("termination signal stream closed before a signal arrived")]
    Closed,
}

/// Waits for one of a set of process signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemShutdownSignal {
    signals: Vec<c_int>,
}

impl SystemShutdownSignal {
    /// Watches [`TERMINATION_SIGNALS`].
    #[must_use]
    pub fn new() -> Self {
        Self::watching(TERMINATION_SIGNALS)
    }

    /// Watches the given signals instead of the default set.
    #[must_use]
    pub fn watching(signals: impl IntoIterator<Item = c_int>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
        }
    }

    /// Signals this listener reacts to.
    #[must_use]
    pub fn signals(&self) -> &[c_int] {
        &self.signals
    }
}

impl Default for SystemShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<StopReason, ShutdownError> {
        let mut signals = Signals::new(&self.signals).map_err(ShutdownError::Install)?;
        signals
            .forever()
            .next()
            .map(StopReason::Signal)
            .ok_or(ShutdownError::Closed)
    }
}
