//! Shared-library backed modules.

use std::ffi::{CStr, CString, c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use libloading::Library;
use serde_json::Value;

use crate::loader::LoadError;
use crate::loader::module::{
    ConstructError, HandlerFault, LoadableModule, MethodSignature, ModuleInstance,
};

use super::abi::{
    ABI_VERSION, ENTRY_SYMBOL, EntryPoint, HostConsole, ModuleDescriptor, ModuleTable,
    ModuleVTable,
};

/// Vtable pointer kept together with the library that owns it.
struct LibraryHandle {
    vtable: NonNull<ModuleVTable>,
    _library: Library,
}

// SAFETY: the vtable is static data inside the library, which stays mapped for
// as long as the handle lives. Libraries must make their functions callable
// from any thread.
unsafe impl Send for LibraryHandle {}
unsafe impl Sync for LibraryHandle {}

impl LibraryHandle {
    fn vtable(&self) -> &ModuleVTable {
        // SAFETY: checked non-null at open time and valid while `_library` is
        // loaded.
        unsafe { self.vtable.as_ref() }
    }
}

/// Opened native module library.
pub struct NativeLibrary {
    path: PathBuf,
    handle: LibraryHandle,
    table: ModuleTable,
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .field("modules", &self.module_names().collect::<Vec<_>>())
            .finish()
    }
}

impl NativeLibrary {
    /// Loads the library at `path` and reads its module description.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: running library initialisers is inherent to loading user
        // code; the module directory is trusted by the platform.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::OpenLibrary {
            path: path.to_path_buf(),
            source,
        })?;
        // SAFETY: the symbol type matches the documented entry point.
        let entry: EntryPoint = unsafe { library.get::<EntryPoint>(ENTRY_SYMBOL) }
            .map(|symbol| *symbol)
            .map_err(|source| LoadError::MissingEntryPoint {
                path: path.to_path_buf(),
                source,
            })?;
        // SAFETY: the entry point takes no arguments and returns static data.
        let vtable = NonNull::new(unsafe { entry() }.cast_mut()).ok_or_else(|| {
            LoadError::NullTable {
                path: path.to_path_buf(),
            }
        })?;
        let handle = LibraryHandle {
            vtable,
            _library: library,
        };

        let found = handle.vtable().abi_version;
        if found != ABI_VERSION {
            return Err(LoadError::AbiVersion {
                path: path.to_path_buf(),
                found,
                expected: ABI_VERSION,
            });
        }

        let table = read_description(path, &handle)?;
        Ok(Self {
            path: path.to_path_buf(),
            handle,
            table,
        })
    }

    /// Path the library was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the modules the library describes, in declaration order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.table.modules.iter().map(|module| module.name.as_str())
    }

    /// Returns the module called `name`, if this library describes it.
    #[must_use]
    pub fn module(self: &Arc<Self>, name: &str) -> Option<Arc<dyn LoadableModule>> {
        let descriptor = self
            .table
            .modules
            .iter()
            .find(|module| module.name == name)?;
        Some(Arc::new(NativeModule {
            library: Arc::clone(self),
            descriptor: Arc::new(descriptor.clone()),
        }))
    }

    /// Copies and releases a library-owned string.
    fn take_string(&self, value: *mut c_char) -> Option<String> {
        if value.is_null() {
            return None;
        }
        // SAFETY: non-null strings returned by the library are NUL-terminated
        // and remain valid until `free_string` is called.
        let text = unsafe { CStr::from_ptr(value) }
            .to_string_lossy()
            .into_owned();
        // SAFETY: `value` came from this library and is released exactly once.
        unsafe { (self.handle.vtable().free_string)(value) };
        Some(text)
    }
}

fn read_description(path: &Path, handle: &LibraryHandle) -> Result<ModuleTable, LoadError> {
    // SAFETY: `describe` returns a static NUL-terminated string or null.
    let raw = unsafe { (handle.vtable().describe)() };
    if raw.is_null() {
        return Err(LoadError::describe(path, "description pointer is null"));
    }
    // SAFETY: checked non-null above; the string is static.
    let text = unsafe { CStr::from_ptr(raw) }
        .to_str()
        .map_err(|error| LoadError::describe(path, error.to_string()))?;
    serde_json::from_str(text).map_err(|error| LoadError::describe(path, error.to_string()))
}

/// Module described by a native library.
struct NativeModule {
    library: Arc<NativeLibrary>,
    descriptor: Arc<ModuleDescriptor>,
}

impl LoadableModule for NativeModule {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn methods(&self) -> &[MethodSignature] {
        &self.descriptor.methods
    }

    fn instantiate(&self) -> Result<Box<dyn ModuleInstance>, ConstructError> {
        if !self.descriptor.constructor {
            return Err(ConstructError::MissingConstructor);
        }
        let name = CString::new(self.name())
            .map_err(|error| ConstructError::Failed(Box::new(error)))?;
        let mut error: *mut c_char = ptr::null_mut();
        // SAFETY: `name` is a valid C string and `error` a valid out-pointer.
        let instance = unsafe {
            (self.library.handle.vtable().construct)(name.as_ptr(), &raw mut error)
        };
        let message = self.library.take_string(error);
        if instance.is_null() {
            let message = message.unwrap_or_else(|| String::from("constructor returned null"));
            return Err(ConstructError::Failed(message.into()));
        }
        Ok(Box::new(NativeInstance {
            library: Arc::clone(&self.library),
            descriptor: Arc::clone(&self.descriptor),
            instance,
        }))
    }
}

struct NativeInstance {
    library: Arc<NativeLibrary>,
    descriptor: Arc<ModuleDescriptor>,
    instance: *mut c_void,
}

// SAFETY: an instance is owned by exactly one invocation and only touched
// through `&mut self` or on drop.
unsafe impl Send for NativeInstance {}

impl ModuleInstance for NativeInstance {
    fn invoke(&mut self, index: usize, args: Vec<Value>) -> Result<Value, HandlerFault> {
        let method = self
            .descriptor
            .methods
            .get(index)
            .ok_or_else(|| format!("method index {index} is out of range"))?;
        let method = CString::new(method.name.as_str())?;
        let args = CString::new(serde_json::to_string(&Value::Array(args))?)?;
        let console = HostConsole::for_current_thread();
        let mut out: *mut c_char = ptr::null_mut();
        // SAFETY: every pointer is valid for the duration of the call and
        // `self.instance` came from `construct` on the same library.
        let status = unsafe {
            (self.library.handle.vtable().invoke)(
                self.instance,
                method.as_ptr(),
                args.as_ptr(),
                &raw const console,
                &raw mut out,
            )
        };
        let text = self.library.take_string(out);
        if status != 0 {
            let message =
                text.unwrap_or_else(|| format!("native method failed with status {status}"));
            return Err(message.into());
        }
        let text = text.ok_or("native method returned no result")?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Drop for NativeInstance {
    fn drop(&mut self) {
        if !self.instance.is_null() {
            // SAFETY: the instance came from `construct` and is destroyed once.
            unsafe { (self.library.handle.vtable().destroy)(self.instance) };
        }
    }
}
