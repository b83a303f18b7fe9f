//! The Slim protocol server.
//!
//! `slimd` listens for a driving test harness, greets it, and then answers
//! framed instruction batches by making fixture instances and calling their
//! methods. The wire format lives in [`slim_protocol`], the conversion layer
//! and fixture contract in [`slim_fixtures`], and command-line handling in
//! [`slim_config`]. This crate wires them together: the dispatcher that runs
//! a batch against a session's symbols and instances, the session loop that
//! frames each exchange, and the process plumbing around a TCP listener.
//!
//! ## Sessions and keep-alive
//!
//! Every connection is a session with its own symbol table, instances and
//! search paths. Without `--keepalive` the server serves exactly one
//! connection and exits. With it, the server keeps accepting until it
//! receives a termination signal, and each new connection starts clean while
//! converter rules registered on the shared registry stay in force.
//!
//! ## Failure containment
//!
//! Anything that goes wrong inside an instruction, including a panic in
//! fixture code, is reported as an exception result for that instruction.
//! Only transport failures and corrupt framing end a session, and no session
//! failure stops the process.

mod bootstrap;
mod dispatch;
mod fixtures;
mod health;
mod process;
mod session;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{ExecutionError, Executor, SessionContext, SymbolError, SymbolTable};
pub use fixtures::{BUILTIN_PACKAGE, EXAMPLES_PACKAGE, register_builtin_fixtures};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, StopReason, SystemShutdownSignal,
    TERMINATION_SIGNALS, run_slimd,
};
pub use session::{SessionEnd, SessionError, SessionSettings, SessionSummary, run_session};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
