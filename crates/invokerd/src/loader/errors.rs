//! Error types for module loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while building the loader or opening module libraries.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The module directory is missing or is not a directory.
    #[error("module directory '{}' does not exist or is not a directory", path.display())]
    ModuleDirNotFound {
        /// Directory named by the request.
        path: PathBuf,
    },
    /// Listing the module directory failed.
    #[error("failed to read module directory '{}': {source}", path.display())]
    ReadDir {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The dynamic linker rejected a library.
    #[error("failed to open module library '{}': {source}", path.display())]
    OpenLibrary {
        /// Library path.
        path: PathBuf,
        /// Underlying loader error.
        #[source]
        source: libloading::Error,
    },
    /// The library does not export the module entry point.
    #[error("module library '{}' does not export the module entry point: {source}", path.display())]
    MissingEntryPoint {
        /// Library path.
        path: PathBuf,
        /// Underlying symbol lookup error.
        #[source]
        source: libloading::Error,
    },
    /// The entry point returned a null table.
    #[error("module library '{}' returned a null module table", path.display())]
    NullTable {
        /// Library path.
        path: PathBuf,
    },
    /// The library was built against another ABI revision.
    #[error("module library '{}' uses ABI version {found}, expected {expected}", path.display())]
    AbiVersion {
        /// Library path.
        path: PathBuf,
        /// Version reported by the library.
        found: u32,
        /// Version supported by this host.
        expected: u32,
    },
    /// The module description could not be read.
    #[error("module library '{}' returned an invalid description: {reason}", path.display())]
    Describe {
        /// Library path.
        path: PathBuf,
        /// What was wrong with the description.
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn describe(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Describe {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
