//! HTTP listener for invocation requests.
//!
//! The transport binds the configured address and serves HTTP/1.1 on the
//! Tokio runtime. Only POST requests whose path contains `invoke` reach the
//! invocation runtime; everything else receives an empty 404. Each invocation
//! runs on its own worker thread, with no cap and no admission queue.

mod errors;
mod listener;
mod routing;

pub use self::errors::ListenerError;
pub use self::listener::{HttpListener, ListenerHandle};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
