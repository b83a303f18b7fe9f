//! Server bootstrap orchestration.

use std::sync::Arc;

use slim_config::{Config, ConfigError};
use slim_fixtures::{ConverterRegistry, FixtureCatalog};
use thiserror::Error;

use crate::dispatch::Executor;
use crate::fixtures::{BUILTIN_PACKAGE, register_builtin_fixtures};
use crate::health::HealthReporter;
use crate::session::{SessionSettings, SlimConnectionHandler};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that hands out an already resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap: everything a listener needs to serve
/// harness connections.
pub struct Server {
    config: Config,
    executor: Arc<Executor>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Server {
    fn new(
        config: Config,
        executor: Executor,
        telemetry: TelemetryHandle,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            config,
            executor: Arc::new(executor),
            telemetry,
            reporter,
        }
    }

    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// The shared executor.
    #[must_use]
    pub const fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// Converter registry shared by every session. Rules registered here are
    /// visible to sessions that start afterwards.
    #[must_use]
    pub fn converters(&self) -> &ConverterRegistry {
        self.executor.converters()
    }

    /// Fixture catalogue shared by every session.
    #[must_use]
    pub fn catalog(&self) -> &FixtureCatalog {
        self.executor.catalog()
    }

    /// Search paths each session starts with: the configured paths, then the
    /// built-in package.
    #[must_use]
    pub fn session_search_paths(&self) -> Vec<String> {
        let mut paths = self.config.search_paths.clone();
        if !paths.iter().any(|path| path == BUILTIN_PACKAGE) {
            paths.push(BUILTIN_PACKAGE.to_owned());
        }
        paths
    }

    pub(crate) fn reporter(&self) -> &Arc<dyn HealthReporter> {
        &self.reporter
    }

    pub(crate) fn connection_handler(&self) -> SlimConnectionHandler {
        SlimConnectionHandler::new(
            Arc::clone(&self.executor),
            SessionSettings::from_config(&self.config),
            self.session_search_paths(),
            Arc::clone(&self.reporter),
        )
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when the configuration cannot be loaded or
/// telemetry cannot be installed. The reporter is told about the failure
/// before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Server, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let catalog = FixtureCatalog::new();
    register_builtin_fixtures(&catalog);
    let executor = Executor::new(
        Arc::new(catalog),
        Arc::new(ConverterRegistry::with_defaults()),
    );
    reporter.bootstrap_succeeded(&config);

    Ok(Server::new(config, executor, telemetry, reporter))
}
