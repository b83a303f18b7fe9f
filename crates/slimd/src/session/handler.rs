//! Bridges accepted connections to the session loop.

use std::net::TcpStream;
use std::sync::Arc;

use tracing::warn;

use super::{SESSION_TARGET, SessionSettings, run_session};
use crate::dispatch::{Executor, SessionContext};
use crate::health::HealthReporter;
use crate::transport::ConnectionHandler;

/// Runs a Slim session on every accepted connection.
///
/// Each connection starts from an empty [`SessionContext`], so nothing a
/// previous harness bound leaks into the next. The executor, and with it the
/// converter registry and fixture catalogue, is shared by all of them.
pub(crate) struct SlimConnectionHandler {
    executor: Arc<Executor>,
    settings: SessionSettings,
    search_paths: Vec<String>,
    reporter: Arc<dyn HealthReporter>,
}

impl SlimConnectionHandler {
    pub(crate) fn new(
        executor: Arc<Executor>,
        settings: SessionSettings,
        search_paths: Vec<String>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            executor,
            settings,
            search_paths,
            reporter,
        }
    }
}

impl ConnectionHandler for SlimConnectionHandler {
    fn handle(&self, mut stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        if let Err(error) = stream.set_nodelay(true) {
            warn!(
                target: SESSION_TARGET,
                error = %error,
                "failed to disable Nagle's algorithm"
            );
        }
        self.reporter.session_started(peer);
        let mut context = SessionContext::new(self.search_paths.clone());
        match run_session(&mut stream, &self.executor, self.settings, &mut context) {
            Ok(summary) => self.reporter.session_finished(&summary),
            Err(error) => self.reporter.session_failed(&error),
        }
    }
}
