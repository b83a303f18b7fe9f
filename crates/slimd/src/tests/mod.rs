//! Test suites for the Slim server.

pub(crate) mod support;
