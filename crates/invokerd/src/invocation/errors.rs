//! Error taxonomy for invocations.

use std::fmt;

use thiserror::Error;

use crate::loader::{ConstructError, HandlerFault, LoadError};

/// Failures decoding the request or its execution context.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not a valid invocation request.
    #[error("invalid invocation request: {source}")]
    Body {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The handler spec is malformed.
    #[error("invalid handler '{handler}': {reason}")]
    Handler {
        /// Handler spec as received.
        handler: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The context variable does not hold valid JSON.
    #[error("invalid execution context in ${variable}: {source}")]
    Context {
        /// Environment variable name.
        variable: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The context variable holds JSON that is not an object.
    #[error("execution context in ${variable} must be a JSON object, found {found}")]
    ContextNotObject {
        /// Environment variable name.
        variable: String,
        /// JSON type found instead.
        found: &'static str,
    },
    /// The context variable is not valid Unicode.
    #[error("execution context in ${variable} is not valid unicode")]
    ContextEncoding {
        /// Environment variable name.
        variable: String,
    },
}

/// Broad category of an invocation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request or context could not be decoded.
    Decode,
    /// The module directory does not exist.
    ModuleDirNotFound,
    /// The loader could not read the module directory or a module library.
    Loader,
    /// No module matches the handler name.
    SymbolNotFound,
    /// The module could not be instantiated.
    Construction,
    /// The module has no method with the requested name.
    MethodNotFound,
    /// The call itself failed.
    Invocation,
}

impl ErrorKind {
    /// Stable identifier used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode_error",
            Self::ModuleDirNotFound => "module_dir_not_found",
            Self::Loader => "loader_error",
            Self::SymbolNotFound => "symbol_not_found",
            Self::Construction => "construction_error",
            Self::MethodNotFound => "method_not_found",
            Self::Invocation => "invocation_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while serving one invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Request decoding failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Building the module loader failed.
    #[error(transparent)]
    Loader(#[from] LoadError),
    /// No module matches the requested name.
    #[error("symbol not found: no module named '{name}'")]
    SymbolNotFound {
        /// Requested module name.
        name: String,
    },
    /// The module exists but its library could not be loaded.
    #[error("failed to load module '{name}': {source}")]
    ModuleLoad {
        /// Requested module name.
        name: String,
        /// Underlying loader error.
        #[source]
        source: LoadError,
    },
    /// The module could not be instantiated.
    #[error("failed to construct '{module}': {source}")]
    Construction {
        /// Module name.
        module: String,
        /// Underlying construction error.
        #[source]
        source: ConstructError,
    },
    /// No public method matches the requested name.
    #[error("method '{method}' not found in '{module}'")]
    MethodNotFound {
        /// Module name.
        module: String,
        /// Requested method name.
        method: String,
    },
    /// The method's parameter count matches no calling convention.
    #[error(
        "'{module}::{method}' declares {arity} parameters; handlers take (params) or (params, context)"
    )]
    Arity {
        /// Module name.
        module: String,
        /// Method name.
        method: String,
        /// Declared parameter count.
        arity: usize,
    },
    /// User code returned an error.
    #[error("'{module}::{method}' failed: {source}")]
    Handler {
        /// Module name.
        module: String,
        /// Method name.
        method: String,
        /// Error raised by user code.
        #[source]
        source: HandlerFault,
    },
    /// User code panicked.
    #[error("'{module}::{method}' panicked: {message}")]
    Panic {
        /// Module name.
        module: String,
        /// Method name.
        method: String,
        /// Panic payload text.
        message: String,
    },
    /// The return value could not be encoded as JSON.
    #[error("failed to encode the result of '{module}::{method}': {source}")]
    SerializeResult {
        /// Module name.
        module: String,
        /// Method name.
        method: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl InvokeError {
    /// Category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Loader(LoadError::ModuleDirNotFound { .. }) => ErrorKind::ModuleDirNotFound,
            Self::Loader(_) | Self::ModuleLoad { .. } => ErrorKind::Loader,
            Self::SymbolNotFound { .. } => ErrorKind::SymbolNotFound,
            Self::Construction { .. } => ErrorKind::Construction,
            Self::MethodNotFound { .. } => ErrorKind::MethodNotFound,
            Self::Arity { .. }
            | Self::Handler { .. }
            | Self::Panic { .. }
            | Self::SerializeResult { .. } => ErrorKind::Invocation,
        }
    }
}
