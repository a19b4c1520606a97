//! Error types for the HTTP listener.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use invoker_config::ListenAddressError;

/// Errors surfaced while binding or running the HTTP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured host could not be resolved.
    #[error("failed to resolve listen address: {source}")]
    Resolve {
        /// Underlying resolution error.
        #[source]
        source: ListenAddressError,
    },
    /// Binding the socket failed.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The bound address could not be queried.
    #[error("failed to read the bound listener address: {source}")]
    LocalAddr {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept loop panicked.
    #[error("listener task panicked")]
    TaskPanic,
}
