//! Search-path module loader chained to the builtin registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::native::NativeLibrary;
use super::{LOADER_TARGET, LoadError, LoadableModule, ModuleResolver, SearchPath};

/// Loader bound to one module directory.
///
/// Names resolve through the parent first, then through the directory entry,
/// then through each archive in search-path order. Libraries are opened on
/// first use and kept for the lifetime of the loader.
pub struct ModuleLoader {
    parent: Arc<dyn ModuleResolver>,
    search_path: SearchPath,
    directory: Mutex<HashMap<PathBuf, Arc<NativeLibrary>>>,
    archives: Vec<ArchiveEntry>,
}

struct ArchiveEntry {
    path: PathBuf,
    library: OnceCell<Option<Arc<NativeLibrary>>>,
}

impl ArchiveEntry {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            library: OnceCell::new(),
        }
    }

    fn library(&self) -> Option<&Arc<NativeLibrary>> {
        self.library
            .get_or_init(|| match NativeLibrary::open(&self.path) {
                Ok(library) => {
                    debug!(
                        target: LOADER_TARGET,
                        archive = %self.path.display(),
                        "opened module archive"
                    );
                    Some(Arc::new(library))
                }
                Err(error) => {
                    warn!(
                        target: LOADER_TARGET,
                        archive = %self.path.display(),
                        error = %error,
                        "skipping module archive that failed to open"
                    );
                    None
                }
            })
            .as_ref()
    }
}

impl ModuleLoader {
    /// Binds a loader to `search_path` with `parent` consulted first.
    #[must_use]
    pub fn new(parent: Arc<dyn ModuleResolver>, search_path: SearchPath) -> Self {
        let archives = search_path
            .archives()
            .iter()
            .cloned()
            .map(ArchiveEntry::new)
            .collect();
        Self {
            parent,
            search_path,
            directory: Mutex::new(HashMap::new()),
            archives,
        }
    }

    /// Directory the loader was built from.
    #[must_use]
    pub fn module_dir(&self) -> &Path {
        self.search_path.root()
    }

    /// Search path the loader walks.
    #[must_use]
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    fn resolve_in_directory(
        &self,
        name: &str,
    ) -> Result<Option<Arc<dyn LoadableModule>>, LoadError> {
        let Some(candidate) = self.search_path.directory_candidate(name) else {
            return Ok(None);
        };
        if !candidate.is_file() {
            return Ok(None);
        }

        let mut libraries = self
            .directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let library = match libraries.get(&candidate) {
            Some(library) => Arc::clone(library),
            None => {
                let library = Arc::new(NativeLibrary::open(&candidate)?);
                debug!(
                    target: LOADER_TARGET,
                    library = %candidate.display(),
                    "opened module library"
                );
                libraries.insert(candidate, Arc::clone(&library));
                library
            }
        };
        Ok(library.module(name))
    }

    fn resolve_in_archives(&self, name: &str) -> Option<Arc<dyn LoadableModule>> {
        self.archives
            .iter()
            .filter_map(ArchiveEntry::library)
            .find_map(|library| library.module(name))
    }
}

impl ModuleResolver for ModuleLoader {
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn LoadableModule>>, LoadError> {
        if let Some(module) = self.parent.resolve(name)? {
            return Ok(Some(module));
        }
        if let Some(module) = self.resolve_in_directory(name)? {
            return Ok(Some(module));
        }
        Ok(self.resolve_in_archives(name))
    }
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("search_path", &self.search_path)
            .finish_non_exhaustive()
    }
}
