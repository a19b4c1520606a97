//! Reflective dispatch of one invocation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::health::HealthReporter;
use crate::loader::{
    BuiltinRegistry, ConstructError, LoadableModule, LoaderCache, ModuleInstance, ModuleResolver,
    SearchPathFactory, panic_message,
};

use super::{DISPATCH_TARGET, ExecutionContext, HandlerSpec, InvocationRequest, InvokeError};

/// Resolves handler specs through the cached loader and calls them.
#[derive(Debug)]
pub struct Dispatcher {
    cache: LoaderCache,
}

impl Dispatcher {
    /// Creates a dispatcher over `cache`.
    #[must_use]
    pub fn new(cache: LoaderCache) -> Self {
        Self { cache }
    }

    /// Creates a dispatcher whose loader is chained to `builtins`.
    #[must_use]
    pub fn with_builtins(builtins: BuiltinRegistry, reporter: Arc<dyn HealthReporter>) -> Self {
        let factory = SearchPathFactory::new(Arc::new(builtins));
        Self::new(LoaderCache::new(Box::new(factory), reporter))
    }

    /// Loader cache backing this dispatcher.
    #[must_use]
    pub fn cache(&self) -> &LoaderCache {
        &self.cache
    }

    /// Runs `request` and returns the JSON text of the handler's return value.
    pub fn dispatch(
        &self,
        request: &InvocationRequest,
        context: ExecutionContext,
    ) -> Result<String, InvokeError> {
        let loader = self.cache.get_or_build(&request.module_dir)?;
        let spec = HandlerSpec::parse(&request.handler)?;

        let module = loader
            .resolve(spec.module())
            .map_err(|source| InvokeError::ModuleLoad {
                name: spec.module().to_owned(),
                source,
            })?
            .ok_or_else(|| InvokeError::SymbolNotFound {
                name: spec.module().to_owned(),
            })?;

        let mut instance = construct(module.as_ref())?;

        let (index, signature) =
            module
                .find_method(spec.method())
                .ok_or_else(|| InvokeError::MethodNotFound {
                    module: spec.module().to_owned(),
                    method: spec.method().to_owned(),
                })?;
        let args = match signature.arity {
            1 => vec![request.params.clone()],
            2 => vec![request.params.clone(), context.into_value()],
            arity => {
                return Err(InvokeError::Arity {
                    module: spec.module().to_owned(),
                    method: spec.method().to_owned(),
                    arity,
                });
            }
        };

        debug!(
            target: DISPATCH_TARGET,
            module = spec.module(),
            method = spec.method(),
            arity = signature.arity,
            "invoking handler"
        );
        let value = call(instance.as_mut(), index, args, &spec)?;
        serde_json::to_string(&value).map_err(|source| InvokeError::SerializeResult {
            module: spec.module().to_owned(),
            method: spec.method().to_owned(),
            source,
        })
    }
}

fn construct(module: &dyn LoadableModule) -> Result<Box<dyn ModuleInstance>, InvokeError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.instantiate()));
    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(ConstructError::Panicked(panic_message(payload.as_ref()))),
    };
    result.map_err(|source| InvokeError::Construction {
        module: module.name().to_owned(),
        source,
    })
}

fn call(
    instance: &mut dyn ModuleInstance,
    index: usize,
    args: Vec<Value>,
    spec: &HandlerSpec,
) -> Result<Value, InvokeError> {
    match panic::catch_unwind(AssertUnwindSafe(|| instance.invoke(index, args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(InvokeError::Handler {
            module: spec.module().to_owned(),
            method: spec.method().to_owned(),
            source,
        }),
        Err(payload) => Err(InvokeError::Panic {
            module: spec.module().to_owned(),
            method: spec.method().to_owned(),
            message: panic_message(payload.as_ref()),
        }),
    }
}
