//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use slim_config::Config;

use crate::bootstrap::BootstrapError;
use crate::session::{SessionError, SessionSummary};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listener is bound and accepting.
    fn listener_ready(&self, addr: SocketAddr);

    /// Invoked when a harness connects.
    fn session_started(&self, peer: Option<SocketAddr>);

    /// Invoked when a session ends cleanly.
    fn session_finished(&self, summary: &SessionSummary);

    /// Invoked when a session is cut short by a transport or framing error.
    fn session_failed(&self, error: &SessionError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, addr: SocketAddr) {
        (**self).listener_ready(addr);
    }

    fn session_started(&self, peer: Option<SocketAddr>) {
        (**self).session_started(peer);
    }

    fn session_finished(&self, summary: &SessionSummary) {
        (**self).session_finished(summary);
    }

    fn session_failed(&self, error: &SessionError) {
        (**self).session_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen(),
            encoding = %config.encoding,
            keepalive = config.keepalive,
            search_paths = ?config.search_paths,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn listener_ready(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            addr = %addr,
            "listening for harness connections"
        );
    }

    fn session_started(&self, peer: Option<SocketAddr>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_started",
            peer = ?peer,
            "harness connected"
        );
    }

    fn session_finished(&self, summary: &SessionSummary) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_finished",
            ended_by = %summary.ended_by,
            batches = summary.batches,
            instructions = summary.instructions,
            bytes_received = summary.bytes_received,
            bytes_sent = summary.bytes_sent,
            "session finished"
        );
    }

    fn session_failed(&self, error: &SessionError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "session_failed",
            error = %error,
            "session terminated"
        );
    }
}
