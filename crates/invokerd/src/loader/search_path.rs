//! Module directory scanning.

use std::fs;
use std::path::{Path, PathBuf};

use super::LoadError;

/// Extension of dependency archives on this platform (`so`, `dylib` or `dll`).
#[must_use]
pub fn archive_extension() -> &'static str {
    std::env::consts::DLL_EXTENSION
}

/// Ordered search path derived from a module directory.
///
/// The directory itself comes first, followed by every archive found directly
/// inside it, ordered by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    root: PathBuf,
    archives: Vec<PathBuf>,
}

impl SearchPath {
    /// Scans `module_dir` once, without recursing into subdirectories.
    pub fn scan(module_dir: &Path) -> Result<Self, LoadError> {
        if !module_dir.is_dir() {
            return Err(LoadError::ModuleDirNotFound {
                path: module_dir.to_path_buf(),
            });
        }

        let read_error = |source| LoadError::ReadDir {
            path: module_dir.to_path_buf(),
            source,
        };
        let mut archives = Vec::new();
        for entry in fs::read_dir(module_dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if path.is_file() && is_archive(&path) {
                archives.push(path);
            }
        }
        archives.sort_by(|left, right| left.file_name().cmp(&right.file_name()));

        Ok(Self {
            root: module_dir.to_path_buf(),
            archives,
        })
    }

    /// The module directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archives in search order.
    #[must_use]
    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    /// Number of entries, counting the directory itself.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archives.len() + 1
    }

    /// Always `false`: the directory is itself an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Library path a fully-qualified name maps to under the directory entry.
    ///
    /// `a.b.C` maps to `{root}/a/b/C.{ext}`. Names with empty segments or
    /// path separators map to nothing.
    #[must_use]
    pub fn directory_candidate(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in name.split('.') {
            if segment.is_empty() || segment.contains(['/', '\\']) {
                return None;
            }
            path.push(segment);
        }
        path.set_extension(archive_extension());
        Some(path)
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(archive_extension()))
}
