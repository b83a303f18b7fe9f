//! TCP listener for harness connections.
//!
//! The transport binds the configured address and hands each accepted
//! stream to a [`ConnectionHandler`]. With keep-alive the accept loop runs on
//! a background thread and every connection gets its own thread; otherwise a
//! single connection is served on the caller's thread.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::ConnectionHandler;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
