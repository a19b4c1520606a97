//! Function-invocation runtime for serverless execution containers.
//!
//! The executor accepts HTTP invocation requests naming a user module, an
//! entry point and its parameters. It loads the module from the request's
//! module directory, calls the entry point reflectively and answers with a
//! JSON body holding the encoded result, a success flag, an error description
//! and optionally the console output produced during the call.
//!
//! The module loader is built once per process from the first request's
//! module directory and reused for the rest of the process lifetime. Names
//! resolve through the builtin registry first and then through the module
//! directory and the shared-library archives inside it (see [`loader`]).
//!
//! Console capture is scoped to the worker thread running an invocation, so
//! concurrent capturing invocations never see each other's output. User code
//! writes through [`capture::stdout`] and [`capture::stderr`]; native modules
//! receive an equivalent callback table.

mod bootstrap;
pub mod builtins;
pub mod capture;
mod health;
pub mod invocation;
pub mod loader;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Executor, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_executor, run_with, serve};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{HttpListener, ListenerError, ListenerHandle};

#[cfg(test)]
mod tests;
