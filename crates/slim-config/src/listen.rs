//! The address the server binds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_HOST, DEFAULT_PORT};

/// TCP bind address.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListenAddress {
    /// Host name or IP address to bind.
    pub host: String,
    /// TCP port. Zero asks the operating system for an ephemeral port.
    pub port: u16,
}

impl ListenAddress {
    /// Builds an address from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ListenAddress {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(formatter, "[{}]:{}", self.host, self.port)
        } else {
            write!(formatter, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_host_and_port() {
        assert_eq!(ListenAddress::default().to_string(), "localhost:8989");
    }

    #[test]
    fn brackets_ipv6_hosts() {
        assert_eq!(ListenAddress::new("::1", 9000).to_string(), "[::1]:9000");
    }
}
