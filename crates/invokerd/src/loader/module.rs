//! Reflective view of loadable user code.
//!
//! A module is anything the loader can resolve by fully-qualified name. It
//! advertises its public methods in declaration order together with their
//! parameter counts, and it can produce instances through a zero-argument
//! constructor. The dispatcher never sees concrete user types; it only works
//! through these traits.

use std::error::Error;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::LoadError;

/// Error raised by user code while constructing or invoking.
pub type HandlerFault = Box<dyn Error + Send + Sync>;

/// Public method advertised by a module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MethodSignature {
    /// Method name as written in handler specs.
    pub name: String,
    /// Number of declared parameters.
    #[serde(rename = "params")]
    pub arity: usize,
}

impl MethodSignature {
    /// Builds a signature.
    #[must_use]
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// Failures raised while instantiating a module.
#[derive(Debug, Error)]
pub enum ConstructError {
    /// The module exposes no public zero-argument constructor.
    #[error("no public zero-argument constructor")]
    MissingConstructor,
    /// The constructor reported an error.
    #[error("constructor failed: {0}")]
    Failed(#[source] HandlerFault),
    /// The constructor panicked.
    #[error("constructor panicked: {0}")]
    Panicked(String),
}

/// Live instance of a module.
pub trait ModuleInstance: Send {
    /// Calls the method at `index` in the module's method table.
    ///
    /// `args` already matches the method's declared arity.
    fn invoke(&mut self, index: usize, args: Vec<Value>) -> Result<Value, HandlerFault>;
}

/// Module resolved by name through the loader.
pub trait LoadableModule: Send + Sync {
    /// Fully-qualified module name.
    fn name(&self) -> &str;

    /// Public methods in declaration order.
    fn methods(&self) -> &[MethodSignature];

    /// Creates an instance through the zero-argument constructor.
    fn instantiate(&self) -> Result<Box<dyn ModuleInstance>, ConstructError>;

    /// Index and signature of the first method named `name`.
    fn find_method(&self, name: &str) -> Option<(usize, &MethodSignature)> {
        self.methods()
            .iter()
            .enumerate()
            .find(|(_, method)| method.name == name)
    }
}

/// Source of modules keyed by fully-qualified name.
pub trait ModuleResolver: Send + Sync {
    /// Resolves `name`, returning `Ok(None)` when this resolver does not
    /// know it.
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn LoadableModule>>, LoadError>;
}

impl<T> ModuleResolver for Arc<T>
where
    T: ModuleResolver + ?Sized,
{
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn LoadableModule>>, LoadError> {
        (**self).resolve(name)
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
