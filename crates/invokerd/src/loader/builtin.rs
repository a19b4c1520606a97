//! Modules compiled into the host binary.
//!
//! The builtin registry is the parent of every module loader: names are looked
//! up here before the module directory is consulted. Modules are described
//! with [`BuiltinModule`], a small builder that records methods in declaration
//! order and erases their Rust signatures into JSON values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::invocation::ExecutionContext;

use super::LoadError;
use super::module::{
    ConstructError, HandlerFault, LoadableModule, MethodSignature, ModuleInstance, ModuleResolver,
};

type Constructor<T> = Arc<dyn Fn() -> Result<T, HandlerFault> + Send + Sync>;
type MethodBody<T> = Arc<dyn Fn(&mut T, Vec<Value>) -> Result<Value, HandlerFault> + Send + Sync>;

/// Builtin module backed by the Rust type `T`.
pub struct BuiltinModule<T> {
    name: String,
    constructor: Option<Constructor<T>>,
    signatures: Vec<MethodSignature>,
    bodies: Vec<MethodBody<T>>,
}

impl<T> BuiltinModule<T>
where
    T: Send + 'static,
{
    /// Starts a module named `name` with no constructor and no methods.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            signatures: Vec::new(),
            bodies: Vec::new(),
        }
    }

    /// Installs the zero-argument constructor.
    #[must_use]
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<T, HandlerFault> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Uses [`Default`] as the zero-argument constructor.
    #[must_use]
    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.with_constructor(|| Ok(T::default()))
    }

    /// Declares a method of any arity taking raw JSON arguments.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(&mut T, Vec<Value>) -> Result<Value, HandlerFault> + Send + Sync + 'static,
    {
        self.signatures.push(MethodSignature::new(name, arity));
        self.bodies.push(Arc::new(body));
        self
    }

    /// Declares a method taking the request parameters.
    #[must_use]
    pub fn unary<F, R>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<R, HandlerFault> + Send + Sync + 'static,
        R: Serialize,
    {
        self.method(name, 1, move |this, args| {
            let mut args = args.into_iter();
            let params = args.next().unwrap_or(Value::Null);
            to_value(body(this, params)?)
        })
    }

    /// Declares a method taking the request parameters and the execution
    /// context.
    #[must_use]
    pub fn binary<F, R>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut T, Value, ExecutionContext) -> Result<R, HandlerFault> + Send + Sync + 'static,
        R: Serialize,
    {
        self.method(name, 2, move |this, args| {
            let mut args = args.into_iter();
            let params = args.next().unwrap_or(Value::Null);
            let context = ExecutionContext::from_value(args.next().unwrap_or(Value::Null));
            to_value(body(this, params, context)?)
        })
    }
}

fn to_value<R: Serialize>(value: R) -> Result<Value, HandlerFault> {
    serde_json::to_value(value).map_err(|error| Box::new(error) as HandlerFault)
}

impl<T> fmt::Debug for BuiltinModule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinModule")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .field("methods", &self.signatures)
            .finish()
    }
}

impl<T> LoadableModule for BuiltinModule<T>
where
    T: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn methods(&self) -> &[MethodSignature] {
        &self.signatures
    }

    fn instantiate(&self) -> Result<Box<dyn ModuleInstance>, ConstructError> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or(ConstructError::MissingConstructor)?;
        let value = constructor().map_err(ConstructError::Failed)?;
        Ok(Box::new(BuiltinInstance {
            value,
            bodies: self.bodies.clone(),
        }))
    }
}

struct BuiltinInstance<T> {
    value: T,
    bodies: Vec<MethodBody<T>>,
}

impl<T> ModuleInstance for BuiltinInstance<T>
where
    T: Send,
{
    fn invoke(&mut self, index: usize, args: Vec<Value>) -> Result<Value, HandlerFault> {
        let body = self
            .bodies
            .get(index)
            .ok_or_else(|| format!("method index {index} is out of range"))?;
        body(&mut self.value, args)
    }
}

/// Parent registry of builtin modules.
#[derive(Default, Clone)]
pub struct BuiltinRegistry {
    modules: HashMap<String, Arc<dyn LoadableModule>>,
}

impl BuiltinRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `module`, replacing any module already registered under its name.
    pub fn register<M>(&mut self, module: M) -> &mut Self
    where
        M: LoadableModule + 'static,
    {
        self.modules
            .insert(module.name().to_owned(), Arc::new(module));
        self
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.modules.keys().collect();
        names.sort();
        f.debug_struct("BuiltinRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleResolver for BuiltinRegistry {
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn LoadableModule>>, LoadError> {
        Ok(self.modules.get(name).cloned())
    }
}
