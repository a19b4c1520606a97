//! Structured health reporting for runtime lifecycle events.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crate::bootstrap::BootstrapError;
use crate::loader::LoadError;

use invoker_config::Config;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the HTTP listener accepts connections.
    fn listener_ready(&self, addr: SocketAddr);

    /// Invoked when the process-wide module loader is published.
    fn loader_published(&self, module_dir: &Path, entries: usize);

    /// Invoked when building the module loader fails.
    fn loader_failed(&self, module_dir: &Path, error: &LoadError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, addr: SocketAddr) {
        (**self).listener_ready(addr);
    }

    fn loader_published(&self, module_dir: &Path, entries: usize) {
        (**self).loader_published(module_dir, entries);
    }

    fn loader_failed(&self, module_dir: &Path, error: &LoadError) {
        (**self).loader_failed(module_dir, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting runtime bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen_address(),
            context_variable = %config.context_variable(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "runtime bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "runtime bootstrap failed"
        );
    }

    fn listener_ready(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            addr = %addr,
            "listening for invocations"
        );
    }

    fn loader_published(&self, module_dir: &Path, entries: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "loader_published",
            module_dir = %module_dir.display(),
            entries,
            "loader created for module directory"
        );
    }

    fn loader_failed(&self, module_dir: &Path, error: &LoadError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "loader_failed",
            module_dir = %module_dir.display(),
            error = %error,
            "module loader construction failed"
        );
    }
}
