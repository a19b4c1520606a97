//! Invocation pipeline: decode, resolve, call, encode.
//!
//! [`InvocationRuntime`] is the boundary the transport talks to. It decodes
//! the request, reads the execution context, optionally wraps the call in an
//! output capture scope, and converts every [`InvokeError`] into a failed
//! [`InvocationResponse`].

mod context;
mod dispatcher;
mod errors;
mod handler_spec;
mod request;
mod response;
mod runtime;

pub use self::context::ExecutionContext;
pub use self::dispatcher::Dispatcher;
pub use self::errors::{DecodeError, ErrorKind, InvokeError};
pub use self::handler_spec::{DEFAULT_METHOD, HandlerSpec};
pub use self::request::InvocationRequest;
pub use self::response::InvocationResponse;
pub use self::runtime::InvocationRuntime;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
