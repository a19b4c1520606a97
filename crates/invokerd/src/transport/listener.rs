//! Accept loop for the HTTP listener.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use invoker_config::ListenAddress;

use crate::invocation::InvocationRuntime;

use super::routing::route;
use super::{LISTENER_TARGET, ListenerError};

const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Bound, not yet serving, HTTP listener.
#[derive(Debug)]
pub struct HttpListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpListener {
    /// Resolves `address` and binds a TCP listener to it.
    pub async fn bind(address: &ListenAddress) -> Result<Self, ListenerError> {
        let addr = address
            .resolve()
            .map_err(|source| ListenerError::Resolve { source })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::BindTcp { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener is bound to, with the OS-assigned port if the
    /// configured port was zero.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections on the current Tokio runtime.
    pub fn start(self, runtime: Arc<InvocationRuntime>) -> ListenerHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(run_accept_loop(self, signal, runtime));
        ListenerHandle {
            shutdown,
            task: Some(task),
        }
    }
}

/// Handle to the background accept loop.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Stops accepting new connections. In-flight invocations run to
    /// completion.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Waits for the accept loop to exit.
    pub async fn join(mut self) -> Result<(), ListenerError> {
        match self.task.take() {
            Some(task) => task.await.map_err(|_| ListenerError::TaskPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

async fn run_accept_loop(
    listener: HttpListener,
    mut shutdown: watch::Receiver<bool>,
    runtime: Arc<InvocationRuntime>,
) {
    info!(
        target: LISTENER_TARGET,
        addr = %listener.local_addr,
        "http listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            accepted = listener.listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    last_error = None;
                    tokio::spawn(serve_connection(stream, peer, Arc::clone(&runtime)));
                }
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(
                            target: LISTENER_TARGET,
                            error = %error,
                            "socket accept error"
                        );
                    }
                    last_error = Some(kind);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            },
        }
    }
    info!(target: LISTENER_TARGET, "http listener stopped");
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, runtime: Arc<InvocationRuntime>) {
    let service =
        service_fn(move |request: Request<Incoming>| route(request, Arc::clone(&runtime)));
    if let Err(error) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        debug!(
            target: LISTENER_TARGET,
            peer = %peer,
            error = %error,
            "connection closed with error"
        );
    }
}
