//! Foreign interface to the native scripting runtime
//!
//! Everything that touches the C ABI lives here: the four exported symbols,
//! their signatures, and the UTF-8 transcoding of text that crosses the
//! boundary. The rest of the crate goes through [`ForeignRuntime`] and never
//! calls into the library directly.

use crate::utils::errors::{HostError, HostResult};
use libloading::Library;
use std::ffi::{c_char, CStr, CString};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Interface revision of the symbol table below
pub const INTERFACE_VERSION: u32 = 1;

pub const SYMBOL_INIT: &str = "runtime_init";
pub const SYMBOL_RUN_SCRIPT: &str = "runtime_runscript";
pub const SYMBOL_DEINIT: &str = "runtime_deinit";
pub const SYMBOL_HELLO: &str = "hello";

/// Raw handle value as it travels across the boundary
pub type RawHandle = i64;

type InitFn = unsafe extern "C" fn(base_dir: *const c_char) -> RawHandle;
type RunScriptFn = unsafe extern "C" fn(handle: RawHandle, source: *const c_char);
type DeinitFn = unsafe extern "C" fn(handle: RawHandle);
type HelloFn = unsafe extern "C" fn();

/// The four operations exported by a runtime library.
///
/// Implementations forward the arguments untouched. Handle bookkeeping is
/// the caller's job: only [`RuntimeHandle`](super::RuntimeHandle) calls
/// `run_script` and `deinitialize`, and only while the handle is live.
pub trait ForeignRuntime: Send + Sync {
    /// `runtime_init`; a non-positive result means failure
    fn initialize(&self, base_dir: &CStr) -> RawHandle;

    /// `runtime_runscript`; blocks until the runtime returns
    fn run_script(&self, handle: RawHandle, source: &CStr);

    /// `runtime_deinit`
    fn deinitialize(&self, handle: RawHandle);

    /// `hello` diagnostic probe
    fn hello(&self) -> HostResult<()>;
}

/// Whether a value returned by `runtime_init` denotes a live runtime
pub fn is_valid_handle(raw: RawHandle) -> bool {
    raw > 0
}

/// Convert text to a NUL-terminated buffer without altering a single byte
pub fn to_foreign_text(what: &'static str, text: &str) -> HostResult<CString> {
    CString::new(text).map_err(|e| HostError::InteriorNul {
        what,
        position: e.nul_position(),
    })
}

/// Convert a path to foreign text, rejecting anything that is not UTF-8
pub fn path_to_foreign_text(what: &'static str, path: &Path) -> HostResult<CString> {
    let text = path
        .to_str()
        .ok_or_else(|| HostError::NonUtf8Path(path.to_path_buf()))?;
    to_foreign_text(what, text)
}

/// A runtime library loaded from disk
pub struct NativeLibrary {
    path: PathBuf,
    init: InitFn,
    run_script: RunScriptFn,
    deinit: DeinitFn,
    hello: Option<HelloFn>,
    /// Keeps the function pointers above valid.
    _lib: Library,
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .field("has_hello", &self.hello.is_some())
            .finish_non_exhaustive()
    }
}

impl NativeLibrary {
    /// Load the library and resolve the lifecycle symbols.
    ///
    /// `runtime_init`, `runtime_runscript` and `runtime_deinit` are required.
    /// `hello` is optional and only needed by [`ForeignRuntime::hello`].
    pub fn load(path: &Path) -> HostResult<Self> {
        // SAFETY: loading runs the library's initializers. The runtime library
        // is trusted host configuration, same as the executable itself.
        let lib = unsafe { Library::new(path) }.map_err(|e| HostError::LibraryLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // SAFETY: the signatures match the runtime's exported C declarations.
        let (init, run_script, deinit, hello) = unsafe {
            let init = *lib
                .get::<InitFn>(SYMBOL_INIT.as_bytes())
                .map_err(|_| HostError::MissingSymbol(SYMBOL_INIT))?;
            let run_script = *lib
                .get::<RunScriptFn>(SYMBOL_RUN_SCRIPT.as_bytes())
                .map_err(|_| HostError::MissingSymbol(SYMBOL_RUN_SCRIPT))?;
            let deinit = *lib
                .get::<DeinitFn>(SYMBOL_DEINIT.as_bytes())
                .map_err(|_| HostError::MissingSymbol(SYMBOL_DEINIT))?;
            let hello = lib.get::<HelloFn>(SYMBOL_HELLO.as_bytes()).ok().map(|s| *s);
            (init, run_script, deinit, hello)
        };

        info!(
            "Loaded runtime library {} (interface v{})",
            path.display(),
            INTERFACE_VERSION
        );
        debug!("Probe symbol present: {}", hello.is_some());

        Ok(Self {
            path: path.to_path_buf(),
            init,
            run_script,
            deinit,
            hello,
            _lib: lib,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ForeignRuntime for NativeLibrary {
    fn initialize(&self, base_dir: &CStr) -> RawHandle {
        // SAFETY: `base_dir` is a valid NUL-terminated string for the call.
        unsafe { (self.init)(base_dir.as_ptr()) }
    }

    fn run_script(&self, handle: RawHandle, source: &CStr) {
        // SAFETY: callers only pass live handles; `source` outlives the call.
        unsafe { (self.run_script)(handle, source.as_ptr()) }
    }

    fn deinitialize(&self, handle: RawHandle) {
        // SAFETY: callers pass each live handle exactly once.
        unsafe { (self.deinit)(handle) }
    }

    fn hello(&self) -> HostResult<()> {
        let hello = self.hello.ok_or(HostError::MissingSymbol(SYMBOL_HELLO))?;
        // SAFETY: `hello` takes no arguments and touches no host state.
        unsafe { hello() };
        Ok(())
    }
}
