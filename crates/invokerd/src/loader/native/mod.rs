//! Native module libraries loaded through `libloading`.

pub mod abi;
mod library;

pub use self::library::NativeLibrary;
