//! Module loading for user code.
//!
//! The loader resolves fully-qualified module names to [`LoadableModule`]
//! values. Builtin modules compiled into the host form the parent registry;
//! the request's module directory and the archives inside it form the search
//! path. The process keeps exactly one loader, published by [`LoaderCache`].

mod builtin;
mod cache;
mod errors;
mod module;
pub mod native;
mod resolver;
mod search_path;

pub use self::builtin::{BuiltinModule, BuiltinRegistry};
pub use self::cache::{LoaderCache, LoaderFactory, SearchPathFactory};
pub use self::errors::LoadError;
pub use self::module::{
    ConstructError, HandlerFault, LoadableModule, MethodSignature, ModuleInstance, ModuleResolver,
};
pub(crate) use self::module::panic_message;
pub use self::resolver::ModuleLoader;
pub use self::search_path::{SearchPath, archive_extension};

const LOADER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::loader");
