//! Listener address resolution.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;

/// Host and port pair the HTTP listener binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddress {
    host: String,
    port: u16,
}

impl ListenAddress {
    /// Builds a listen address from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Configured host name or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Configured port. Zero asks the OS for an ephemeral port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the address to the first socket address the resolver yields.
    pub fn resolve(&self) -> Result<SocketAddr, ListenAddressError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ListenAddressError::EmptyHost);
        }
        let mut addrs =
            (host, self.port)
                .to_socket_addrs()
                .map_err(|source| ListenAddressError::Resolve {
                    host: host.to_owned(),
                    port: self.port,
                    source,
                })?;
        addrs.next().ok_or_else(|| ListenAddressError::ResolveEmpty {
            host: host.to_owned(),
            port: self.port,
        })
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

/// Errors raised while resolving the listen address.
#[derive(Debug, Error)]
pub enum ListenAddressError {
    /// The host was blank.
    #[error("listen host is empty")]
    EmptyHost,
    /// Name resolution failed.
    #[error("failed to resolve listen address {host}:{port}: {source}")]
    Resolve {
        /// Host that failed to resolve.
        host: String,
        /// Requested port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Name resolution returned no usable address.
    #[error("no addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Host that resolved to nothing.
        host: String,
        /// Requested port.
        port: u16,
    },
}
