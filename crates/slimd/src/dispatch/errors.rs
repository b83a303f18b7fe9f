//! Failures localised to a single instruction.

use slim_fixtures::{CatalogError, ConversionError, FixtureError};
use slim_protocol::{InstructionError, Outcome};
use thiserror::Error;

use super::symbols::SymbolError;

/// Why an instruction failed. Every variant becomes an exception result for
/// that instruction alone.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The entry did not parse as an instruction.
    #[error("{} {source}", .source.code())]
    Malformed {
        /// Parser diagnosis.
        #[source]
        source: InstructionError,
    },
    /// An Import path is empty or contains a NUL.
    #[error("INVALID_IMPORT_PATH {path:?}")]
    InvalidImportPath {
        /// Path as received.
        path: String,
    },
    /// No class matched the requested name.
    #[error("NO_CLASS {class} {source}")]
    NoClass {
        /// Class name as requested.
        class: String,
        /// Catalogue diagnosis.
        #[source]
        source: CatalogError,
    },
    /// The constructor failed or panicked.
    #[error("COULD_NOT_INVOKE_CONSTRUCTOR {class} {message}")]
    Instantiation {
        /// Class being instantiated.
        class: String,
        /// Constructor failure description.
        message: String,
        /// Whether the constructor asked to stop the test.
        stop_test: bool,
    },
    /// No instance is bound under the requested name.
    #[error("NO_INSTANCE {instance}")]
    NoInstance {
        /// Instance name as requested.
        instance: String,
    },
    /// Neither the instance nor any library has the method.
    #[error("NO_METHOD_IN_CLASS {method} {class}")]
    NoMethod {
        /// Method name as requested.
        method: String,
        /// Class of the target instance.
        class: String,
    },
    /// An argument or result could not be converted.
    #[error("NO_CONVERTER_FOR_ARGUMENT {source}")]
    Conversion {
        /// Converter diagnosis.
        #[source]
        source: ConversionError,
    },
    /// An argument referenced a symbol that is not bound.
    #[error("UNRESOLVED_SYMBOL {source}")]
    UnresolvedSymbol {
        /// Substitution diagnosis.
        #[source]
        source: SymbolError,
    },
    /// The fixture method failed or panicked.
    #[error("{message}")]
    Invocation {
        /// The fixture's own description.
        message: String,
        /// Whether the fixture asked to stop the test.
        stop_test: bool,
    },
}

impl ExecutionError {
    /// Slim error code for this failure, if it has one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Malformed { source } => Some(source.code()),
            Self::InvalidImportPath { .. } => Some("INVALID_IMPORT_PATH"),
            Self::NoClass { .. } => Some("NO_CLASS"),
            Self::Instantiation { .. } => Some("COULD_NOT_INVOKE_CONSTRUCTOR"),
            Self::NoInstance { .. } => Some("NO_INSTANCE"),
            Self::NoMethod { .. } => Some("NO_METHOD_IN_CLASS"),
            Self::Conversion { .. } => Some("NO_CONVERTER_FOR_ARGUMENT"),
            Self::UnresolvedSymbol { .. } => Some("UNRESOLVED_SYMBOL"),
            Self::Invocation { .. } => None,
        }
    }

    /// Wraps a constructor failure.
    pub fn instantiation(class: impl Into<String>, error: &FixtureError) -> Self {
        Self::Instantiation {
            class: class.into(),
            message: error.message().to_owned(),
            stop_test: error.is_stop_test(),
        }
    }

    /// Renders the failure as an exception outcome.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        let stop_test = matches!(
            self,
            Self::Invocation {
                stop_test: true,
                ..
            } | Self::Instantiation {
                stop_test: true,
                ..
            }
        );
        Outcome::Exception {
            message: self.to_string(),
            stop_test,
        }
    }
}

impl From<FixtureError> for ExecutionError {
    fn from(error: FixtureError) -> Self {
        Self::Invocation {
            stop_test: error.is_stop_test(),
            message: error.message().to_owned(),
        }
    }
}

impl From<ConversionError> for ExecutionError {
    fn from(source: ConversionError) -> Self {
        Self::Conversion { source }
    }
}

impl From<SymbolError> for ExecutionError {
    fn from(source: SymbolError) -> Self {
        Self::UnresolvedSymbol { source }
    }
}
