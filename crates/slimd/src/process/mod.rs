//! Process lifecycle: serve once, or serve until a termination signal.

mod errors;
mod launch;
mod shutdown;

pub use self::errors::LaunchError;
pub use self::launch::run_slimd;
#[cfg(test)]
pub(crate) use self::launch::run_slimd_with;
pub use self::shutdown::{
    ShutdownError, ShutdownSignal, StopReason, SystemShutdownSignal, TERMINATION_SIGNALS,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
