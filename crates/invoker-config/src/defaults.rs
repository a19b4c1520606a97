//! Built-in configuration defaults.
//!
//! Every value matches what the serverless platform expects from an executor
//! container: an HTTP listener on port 8080 on all interfaces and the
//! execution context in the `CONTEXT` environment variable.

use crate::logging::LogFormat;

/// Port the platform routes invocation requests to.
pub const DEFAULT_PORT: u16 = 8080;

/// Interface the listener binds when no host is configured.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable carrying the execution context document.
pub const DEFAULT_CONTEXT_VARIABLE: &str = "CONTEXT";

/// Default listen port.
#[must_use]
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Owned listen host used where allocation is required (e.g. serde).
#[must_use]
pub fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_owned()
}

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned context variable name used where allocation is required.
#[must_use]
pub fn default_context_variable() -> String {
    DEFAULT_CONTEXT_VARIABLE.to_owned()
}
