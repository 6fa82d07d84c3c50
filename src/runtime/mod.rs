//! Hosting of the native scripting runtime
//!
//! - [`apartment`]: COM apartment the runtime is driven from on Windows
//! - [`ffi`]: the foreign interface and the dynamically loaded library
//! - [`handle`]: single-owner wrapper for one live runtime instance
//! - [`host`]: full init/read/run/deinit cycles

pub mod apartment;
pub mod ffi;
pub mod handle;
pub mod host;

pub use apartment::ComApartment;
pub use ffi::{ForeignRuntime, NativeLibrary, RawHandle};
pub use handle::{HandleState, RuntimeHandle};
pub use host::{EntryScript, RunReport, RuntimeHost};
