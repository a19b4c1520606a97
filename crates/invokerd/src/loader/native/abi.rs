//! C ABI shared with native module libraries.
//!
//! A library exports [`ENTRY_SYMBOL`], returning a pointer to a static
//! [`ModuleVTable`]. Strings crossing the boundary are NUL-terminated UTF-8.
//! Strings handed to the host through out-parameters are owned by the library
//! and released with `free_string` once the host has copied them.

use std::ffi::{c_char, c_void};
use std::io::Write;
use std::slice;

use serde::Deserialize;

use crate::capture;
use crate::loader::module::MethodSignature;

/// Exported entry point name, NUL-terminated for symbol lookup.
pub const ENTRY_SYMBOL: &[u8] = b"invoker_module_v1\0";

/// ABI revision implemented by this host.
pub const ABI_VERSION: u32 = 1;

/// Stream id for standard output in [`HostConsole::write`].
pub const STREAM_STDOUT: u32 = 1;

/// Stream id for standard error in [`HostConsole::write`].
pub const STREAM_STDERR: u32 = 2;

/// Signature of [`ENTRY_SYMBOL`].
pub type EntryPoint = unsafe extern "C" fn() -> *const ModuleVTable;

/// Console handed to native code for the duration of one call.
///
/// `write` must be called on the thread that received the console.
#[repr(C)]
pub struct HostConsole {
    /// Opaque host data passed back to `write`.
    pub context: *mut c_void,
    /// Appends `len` bytes at `data` to `stream`.
    pub write: unsafe extern "C" fn(context: *mut c_void, stream: u32, data: *const u8, len: usize),
}

impl HostConsole {
    /// Console routing into the calling thread's capture sinks.
    pub(crate) fn for_current_thread() -> Self {
        Self {
            context: std::ptr::null_mut(),
            write: host_write,
        }
    }
}

/// Function table exported by a native module library.
#[repr(C)]
pub struct ModuleVTable {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u32,
    /// Returns the static module description as JSON.
    pub describe: unsafe extern "C" fn() -> *const c_char,
    /// Instantiates the module `name`; returns null and sets `error` on
    /// failure.
    pub construct: unsafe extern "C" fn(name: *const c_char, error: *mut *mut c_char) -> *mut c_void,
    /// Calls `method` with a JSON array of arguments. Returns 0 and stores the
    /// JSON result in `out`, or non-zero with error text in `out`.
    pub invoke: unsafe extern "C" fn(
        instance: *mut c_void,
        method: *const c_char,
        args_json: *const c_char,
        console: *const HostConsole,
        out: *mut *mut c_char,
    ) -> i32,
    /// Releases an instance returned by `construct`.
    pub destroy: unsafe extern "C" fn(instance: *mut c_void),
    /// Releases a string returned through an out-parameter.
    pub free_string: unsafe extern "C" fn(value: *mut c_char),
}

/// Parsed form of the `describe` document.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModuleTable {
    pub(crate) modules: Vec<ModuleDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModuleDescriptor {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) constructor: bool,
    #[serde(default)]
    pub(crate) methods: Vec<MethodSignature>,
}

unsafe extern "C" fn host_write(_context: *mut c_void, stream: u32, data: *const u8, len: usize) {
    if data.is_null() || len == 0 {
        return;
    }
    // SAFETY: the library guarantees `data` points at `len` readable bytes for
    // the duration of the call.
    let bytes = unsafe { slice::from_raw_parts(data, len) };
    let mut console = match stream {
        STREAM_STDERR => capture::stderr(),
        _ => capture::stdout(),
    };
    let _ = console.write_all(bytes);
}
