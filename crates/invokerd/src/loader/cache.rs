//! Process-wide, construct-once module loader cache.
//!
//! The first request that needs a loader builds it from its module directory.
//! Concurrent first callers block on that single construction and all observe
//! the same loader. A failed construction publishes nothing, so the next
//! request retries. Once published the loader is never replaced: requests
//! naming another directory are served from the first one.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::warn;

use crate::health::HealthReporter;

use super::{LOADER_TARGET, LoadError, ModuleLoader, ModuleResolver, SearchPath};

/// Builds a loader for a module directory.
pub trait LoaderFactory: Send + Sync {
    /// Constructs a loader bound to `module_dir`.
    fn build(&self, module_dir: &Path) -> Result<ModuleLoader, LoadError>;
}

/// Factory that scans the module directory and chains the loader to a parent
/// resolver.
#[derive(Clone)]
pub struct SearchPathFactory {
    parent: Arc<dyn ModuleResolver>,
}

impl SearchPathFactory {
    /// Creates a factory whose loaders consult `parent` first.
    #[must_use]
    pub fn new(parent: Arc<dyn ModuleResolver>) -> Self {
        Self { parent }
    }
}

impl LoaderFactory for SearchPathFactory {
    fn build(&self, module_dir: &Path) -> Result<ModuleLoader, LoadError> {
        let search_path = SearchPath::scan(module_dir)?;
        Ok(ModuleLoader::new(Arc::clone(&self.parent), search_path))
    }
}

/// Holder for the single published loader.
pub struct LoaderCache {
    loader: OnceCell<Arc<ModuleLoader>>,
    factory: Box<dyn LoaderFactory>,
    reporter: Arc<dyn HealthReporter>,
}

impl LoaderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(factory: Box<dyn LoaderFactory>, reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            loader: OnceCell::new(),
            factory,
            reporter,
        }
    }

    /// Returns the published loader, building it from `module_dir` when none
    /// exists yet.
    pub fn get_or_build(&self, module_dir: &Path) -> Result<Arc<ModuleLoader>, LoadError> {
        let loader = match self.loader.get() {
            Some(loader) => loader,
            None => self.loader.get_or_try_init(|| self.build(module_dir))?,
        };
        if loader.module_dir() != module_dir {
            warn!(
                target: LOADER_TARGET,
                requested = %module_dir.display(),
                loaded = %loader.module_dir().display(),
                "module directory differs from the loaded one; reusing the loaded module"
            );
        }
        Ok(Arc::clone(loader))
    }

    /// The published loader, if any.
    #[must_use]
    pub fn get(&self) -> Option<&Arc<ModuleLoader>> {
        self.loader.get()
    }

    fn build(&self, module_dir: &Path) -> Result<Arc<ModuleLoader>, LoadError> {
        match self.factory.build(module_dir) {
            Ok(loader) => {
                self.reporter
                    .loader_published(loader.module_dir(), loader.search_path().len());
                Ok(Arc::new(loader))
            }
            Err(error) => {
                self.reporter.loader_failed(module_dir, &error);
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for LoaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderCache")
            .field("loader", &self.loader.get())
            .finish_non_exhaustive()
    }
}
