//! Shared configuration for the invocation runtime.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file (`--config-path` or `INVOKER_CONFIG_PATH`), then
//! `INVOKER_*` environment variables, then command-line flags. The executor
//! normally runs with defaults inside the platform container; the other
//! layers exist for local runs and tests.

mod defaults;
mod listen;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_CONTEXT_VARIABLE, DEFAULT_LISTEN_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT,
    default_context_variable, default_listen_host, default_log_filter, default_log_filter_string,
    default_log_format, default_port,
};
pub use self::listen::{ListenAddress, ListenAddressError};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "INVOKER")]
pub struct Config {
    /// Interface the HTTP listener binds.
    #[serde(default = "defaults::default_listen_host")]
    #[ortho_config(default = defaults::default_listen_host())]
    pub listen_host: String,
    /// Port the HTTP listener binds.
    #[serde(default = "defaults::default_port")]
    #[ortho_config(default = defaults::default_port())]
    pub port: u16,
    /// `tracing` filter expression applied to daemon logs.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for daemon logs.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Environment variable holding the execution context JSON document.
    #[serde(default = "defaults::default_context_variable")]
    #[ortho_config(default = defaults::default_context_variable())]
    pub context_variable: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            port: default_port(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            context_variable: default_context_variable(),
        }
    }
}

impl Config {
    /// Address the HTTP listener binds.
    #[must_use]
    pub fn listen_address(&self) -> ListenAddress {
        ListenAddress::new(self.listen_host.clone(), self.port)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Name of the environment variable carrying the execution context.
    #[must_use]
    pub fn context_variable(&self) -> &str {
        self.context_variable.as_str()
    }
}
