//! Test harness utilities shared by the executor suites.

use std::ffi::OsString;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};
use serde_json::{Value, json};

use invoker_config::Config;

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::builtins;
use crate::capture;
use crate::health::HealthReporter;
use crate::invocation::{Dispatcher, InvocationRuntime};
use crate::loader::{BuiltinModule, BuiltinRegistry, HandlerFault, LoadError};

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(SocketAddr),
    LoaderPublished(PathBuf),
    LoaderFailed(PathBuf),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    pub fn loaders_published(&self) -> usize {
        self.count(|event| matches!(event, HealthEvent::LoaderPublished(_)))
    }

    pub fn loaders_failed(&self) -> usize {
        self.count(|event| matches!(event, HealthEvent::LoaderFailed(_)))
    }

    /// Address reported by the most recent `listener_ready` event.
    pub fn listener_addr(&self) -> Option<SocketAddr> {
        self.events().into_iter().rev().find_map(|event| match event {
            HealthEvent::ListenerReady(addr) => Some(addr),
            _ => None,
        })
    }

    fn count(&self, predicate: impl Fn(&HealthEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, addr: SocketAddr) {
        self.record(HealthEvent::ListenerReady(addr));
    }

    fn loader_published(&self, module_dir: &Path, _entries: usize) {
        self.record(HealthEvent::LoaderPublished(module_dir.to_path_buf()));
    }

    fn loader_failed(&self, module_dir: &Path, _error: &LoadError) {
        self.record(HealthEvent::LoaderFailed(module_dir.to_path_buf()));
    }
}

/// Configuration binding an ephemeral loopback port.
pub fn loopback_config(context_variable: &str) -> Config {
    Config {
        listen_host: String::from("127.0.0.1"),
        port: 0,
        context_variable: context_variable.to_owned(),
        ..Config::default()
    }
}

/// Loader resolving the layered configuration from the binary name alone.
pub struct BareCommandLineLoader;

impl ConfigLoader for BareCommandLineLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![OsString::from("invokerd")])
    }
}

/// Loader that fails by passing an invalid port on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![
            OsString::from("invokerd"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ])
    }
}

/// Returns an environment variable name no other test uses.
pub fn unique_variable(tag: &str) -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let id = NEXT.fetch_add(1, Ordering::SeqCst);
    format!("INVOKERD_TEST_{}_{id}", tag.to_ascii_uppercase())
}

/// Sets `variable` for the rest of the test process.
pub fn set_context(variable: &str, document: &str) {
    // Edition 2024 marks environment mutation `unsafe`. Every caller uses a
    // variable name from `unique_variable`, so no other test reads it.
    unsafe { std::env::set_var(variable, document) };
}

#[derive(Debug, Default)]
struct Fixture;

/// Builtins plus the fixture modules exercised by the suites.
pub fn fixture_registry() -> BuiltinRegistry {
    let mut registry = builtins::registry();
    registry
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Greeter")
                .with_default()
                .unary("handler", |_, _| Ok("hello"))
                .unary("bar", |_, _| Ok("bar")),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.NoConstructor")
                .unary("handler", |_, params| Ok(params)),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.PanickyConstructor")
                .with_constructor(|| panic!("constructor exploded"))
                .unary("handler", |_, params| Ok(params)),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.ThreeParams")
                .with_default()
                .method("handler", 3, |_, _| Ok(Value::Null)),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.ZeroParams")
                .with_default()
                .method("handler", 0, |_, _| Ok(Value::Null)),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Noisy")
                .with_default()
                .unary("handler", |_, _| {
                    write!(capture::stdout(), "A")?;
                    write!(capture::stderr(), "B")?;
                    Ok("done")
                }),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Tagged")
                .with_default()
                .unary("handler", |_, params| {
                    let tag = params.as_str().unwrap_or("untagged").to_owned();
                    for _ in 0..100 {
                        writeln!(capture::stdout(), "{tag}")?;
                        std::thread::yield_now();
                    }
                    Ok(tag)
                }),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Contextual")
                .with_default()
                .binary("handler", |_, params, context| {
                    Ok(json!({ "params": params, "context": context }))
                }),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Overloaded")
                .with_default()
                .binary("handler", |_, _, _| Ok("two"))
                .unary("handler", |_, _| Ok("one")),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Failing")
                .with_default()
                .unary("handler", |_, _| -> Result<Value, HandlerFault> {
                    Err(HandlerFault::from("handler refused"))
                }),
        )
        .register(
            BuiltinModule::<Fixture>::new("fixtures.Panicking")
                .with_default()
                .unary("handler", |_, _| -> Result<Value, HandlerFault> {
                    panic!("handler exploded")
                }),
        );
    registry
}

/// Runtime over [`fixture_registry`] reading the context from
/// `context_variable`.
pub fn fixture_runtime(context_variable: &str) -> (InvocationRuntime, Arc<RecordingHealthReporter>) {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let dispatcher = Dispatcher::with_builtins(fixture_registry(), reporter.clone());
    (
        InvocationRuntime::new(dispatcher, context_variable),
        reporter,
    )
}

/// Encodes an invocation request body.
pub fn request_body(handler: &str, module_dir: &Path, params: Value, return_output: bool) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "Handler": handler,
        "ModuleDir": module_dir,
        "Params": params,
        "ReturnOutput": return_output,
    }))
    .expect("encode request body")
}
