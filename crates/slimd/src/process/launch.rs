//! Supervises server launch sequencing.

use std::sync::Arc;

use tracing::{error, info};

use crate::bootstrap::{
    ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the server using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration, bootstrap, binding or signal
/// installation fails.
pub fn run_slimd() -> Result<(), LaunchError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    run_slimd_with(&SystemConfigLoader, reporter, &SystemShutdownSignal::new())
}

/// Runs the server with injected collaborators.
pub(crate) fn run_slimd_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let config = loader.load()?;
    let server = bootstrap_with(&StaticConfigLoader::new(config), reporter)?;
    info!(
        target: PROCESS_TARGET,
        keepalive = server.config().keepalive,
        "starting server runtime"
    );
    serve(&server, shutdown)?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

fn serve(server: &Server, shutdown: &dyn ShutdownSignal) -> Result<(), LaunchError> {
    let listener = SocketListener::bind(server.config().listen()).inspect_err(|error| {
        error!(
            target: PROCESS_TARGET,
            error = %error,
            "failed to bind harness listener"
        );
    })?;
    if let Some(addr) = listener.local_addr() {
        server.reporter().listener_ready(addr);
    }
    let handler = server.connection_handler();

    if !server.config().keepalive {
        listener.serve_one(&handler)?;
        return Ok(());
    }

    let listener_handle = listener.start(Arc::new(handler))?;
    let reason = shutdown.wait()?;
    info!(
        target: PROCESS_TARGET,
        %reason,
        "stopping harness listener"
    );
    listener_handle.shutdown();
    listener_handle.join()?;
    Ok(())
}
