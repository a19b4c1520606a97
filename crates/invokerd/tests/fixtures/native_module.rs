//! Native module library used by the loader tests.
//!
//! The build script compiles this file into shared libraries exporting
//! `invoker_module_v1`. Compiling with `--cfg abi_mismatch` or
//! `--cfg null_table` yields the broken variants.
//!
//! `demo.Greeter` declares `handler(params, context)`, which writes `A` to
//! stdout and `B` to stderr and returns its argument array, and `fail(params)`,
//! which always fails. `demo.Static` has no zero-argument constructor.

use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

#[repr(C)]
pub struct HostConsole {
    context: *mut c_void,
    write: unsafe extern "C" fn(context: *mut c_void, stream: u32, data: *const u8, len: usize),
}

#[repr(C)]
pub struct ModuleVTable {
    abi_version: u32,
    describe: unsafe extern "C" fn() -> *const c_char,
    construct: unsafe extern "C" fn(name: *const c_char, error: *mut *mut c_char) -> *mut c_void,
    invoke: unsafe extern "C" fn(
        instance: *mut c_void,
        method: *const c_char,
        args_json: *const c_char,
        console: *const HostConsole,
        out: *mut *mut c_char,
    ) -> i32,
    destroy: unsafe extern "C" fn(instance: *mut c_void),
    free_string: unsafe extern "C" fn(value: *mut c_char),
}

#[cfg(not(abi_mismatch))]
const ABI_VERSION: u32 = 1;
#[cfg(abi_mismatch)]
const ABI_VERSION: u32 = 2;

const STDOUT: u32 = 1;
const STDERR: u32 = 2;

static DESCRIPTION: &CStr = c"{\"modules\":[\
{\"name\":\"demo.Greeter\",\"constructor\":true,\"methods\":[\
{\"name\":\"handler\",\"params\":2},{\"name\":\"fail\",\"params\":1}]},\
{\"name\":\"demo.Static\",\"constructor\":false,\"methods\":[\
{\"name\":\"handler\",\"params\":1}]}]}";

static VTABLE: ModuleVTable = ModuleVTable {
    abi_version: ABI_VERSION,
    describe,
    construct,
    invoke,
    destroy,
    free_string,
};

static LIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);
static LIVE_STRINGS: AtomicUsize = AtomicUsize::new(0);

struct Greeter {
    name: String,
}

fn owned_string(text: &str) -> *mut c_char {
    match CString::new(text) {
        Ok(value) => {
            LIVE_STRINGS.fetch_add(1, Ordering::SeqCst);
            value.into_raw()
        }
        Err(_) => ptr::null_mut(),
    }
}

unsafe extern "C" fn describe() -> *const c_char {
    DESCRIPTION.as_ptr()
}

unsafe extern "C" fn construct(name: *const c_char, error: *mut *mut c_char) -> *mut c_void {
    let name = unsafe { CStr::from_ptr(name) };
    if name.to_bytes() != b"demo.Greeter" {
        unsafe { *error = owned_string("no constructor for this module") };
        return ptr::null_mut();
    }
    LIVE_INSTANCES.fetch_add(1, Ordering::SeqCst);
    Box::into_raw(Box::new(Greeter {
        name: String::from("greeter"),
    }))
    .cast()
}

unsafe extern "C" fn invoke(
    instance: *mut c_void,
    method: *const c_char,
    args_json: *const c_char,
    console: *const HostConsole,
    out: *mut *mut c_char,
) -> i32 {
    let greeter = unsafe { &*instance.cast::<Greeter>() };
    let method = unsafe { CStr::from_ptr(method) };
    match method.to_bytes() {
        b"handler" => {
            let console = unsafe { &*console };
            unsafe {
                (console.write)(console.context, STDOUT, b"A".as_ptr(), 1);
                (console.write)(console.context, STDERR, b"B".as_ptr(), 1);
            }
            let args = unsafe { CStr::from_ptr(args_json) };
            unsafe { *out = owned_string(&args.to_string_lossy()) };
            0
        }
        b"fail" => {
            unsafe { *out = owned_string(&format!("{} refused", greeter.name)) };
            1
        }
        _ => {
            unsafe { *out = owned_string("unknown method") };
            2
        }
    }
}

unsafe extern "C" fn destroy(instance: *mut c_void) {
    drop(unsafe { Box::from_raw(instance.cast::<Greeter>()) });
    LIVE_INSTANCES.fetch_sub(1, Ordering::SeqCst);
}

unsafe extern "C" fn free_string(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(value) });
    LIVE_STRINGS.fetch_sub(1, Ordering::SeqCst);
}

#[unsafe(no_mangle)]
pub extern "C" fn invoker_module_v1() -> *const ModuleVTable {
    if cfg!(null_table) {
        ptr::null()
    } else {
        &raw const VTABLE
    }
}

/// Instances constructed and not yet destroyed.
#[unsafe(no_mangle)]
pub extern "C" fn invoker_fixture_live_instances() -> usize {
    LIVE_INSTANCES.load(Ordering::SeqCst)
}

/// Strings handed to the host and not yet released.
#[unsafe(no_mangle)]
pub extern "C" fn invoker_fixture_live_strings() -> usize {
    LIVE_STRINGS.load(Ordering::SeqCst)
}
