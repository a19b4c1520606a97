//! Process entry: bootstrap, serve until interrupted, shut down.

use std::future::Future;
use std::io;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::{BootstrapError, ConfigLoader, Executor, SystemConfigLoader, bootstrap_with};
use crate::builtins;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::loader::BuiltinRegistry;
use crate::transport::{HttpListener, ListenerError};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
const IO_THREAD_NAME: &str = "invokerd-io";

/// Errors surfaced while launching or running the executor process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The async runtime could not be built.
    #[error("failed to start the async runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener failed to bind or stopped abnormally.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Runs the executor with the system configuration until Ctrl-C.
pub fn run_executor() -> Result<(), LaunchError> {
    run_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        builtins::registry(),
    )
}

/// Runs the executor with explicit collaborators until Ctrl-C.
pub fn run_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    builtins: BuiltinRegistry,
) -> Result<(), LaunchError> {
    let executor = bootstrap_with(loader, reporter, builtins)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(IO_THREAD_NAME)
        .build()
        .map_err(|source| LaunchError::Runtime { source })?;
    runtime.block_on(serve(&executor, interrupted()))
}

/// Binds the listener, serves invocations and stops once `shutdown`
/// completes.
pub async fn serve<F>(executor: &Executor, shutdown: F) -> Result<(), LaunchError>
where
    F: Future<Output = ()>,
{
    let listener = HttpListener::bind(&executor.config().listen_address()).await?;
    executor.reporter().listener_ready(listener.local_addr());
    let handle = listener.start(executor.invocation_runtime());

    shutdown.await;
    info!(target: PROCESS_TARGET, "shutdown requested");
    handle.shutdown();
    handle.join().await?;
    Ok(())
}

async fn interrupted() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(
            target: PROCESS_TARGET,
            error = %error,
            "failed to listen for Ctrl-C; serving until killed"
        );
        std::future::pending::<()>().await;
    }
}
