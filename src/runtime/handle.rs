//! Single-owner wrapper around a live runtime handle

use super::ffi::{self, ForeignRuntime, RawHandle};
use crate::utils::errors::{HostError, HostResult};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle lifecycle: `Uninitialized -> Live -> Deinitialized`.
/// Uninitialized has no value; a `RuntimeHandle` only exists once live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Live,
    Deinitialized,
}

/// A live runtime instance.
///
/// Construction performs `runtime_init`; the value only exists while the
/// handle is live. Teardown happens exactly once, either through
/// [`RuntimeHandle::deinitialize`] (which consumes the value) or on drop.
/// Running a script therefore cannot reach an invalidated handle, and a
/// second teardown cannot be expressed.
///
/// The type is neither `Send` nor `Sync`: the runtime is driven from the
/// thread that created it.
pub struct RuntimeHandle {
    library: Arc<dyn ForeignRuntime>,
    raw: RawHandle,
    state: HandleState,
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("raw", &self.raw)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RuntimeHandle {
    /// Call `runtime_init` with `base_dir`.
    ///
    /// A sentinel result is reported as [`HostError::InitializationFailure`]
    /// and no further foreign call is made for it.
    pub fn initialize(library: Arc<dyn ForeignRuntime>, base_dir: &Path) -> HostResult<Self> {
        let text = ffi::path_to_foreign_text("base directory", base_dir)?;

        debug!("runtime_init({})", base_dir.display());
        let raw = library.initialize(&text);

        if !ffi::is_valid_handle(raw) {
            return Err(HostError::InitializationFailure {
                base_dir: base_dir.to_path_buf(),
                handle: raw,
            });
        }

        info!("Runtime initialized (handle {:#x})", raw);
        Ok(Self {
            library,
            raw,
            state: HandleState::Live,
            _not_send: PhantomData,
        })
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Hand the full script source to the runtime and wait for it to return
    pub fn run_script(&mut self, source: &str) -> HostResult<()> {
        debug_assert_eq!(self.state, HandleState::Live);
        let text = ffi::to_foreign_text("entry script", source)?;

        debug!("runtime_runscript({:#x}, {} bytes)", self.raw, source.len());
        self.library.run_script(self.raw, &text);
        Ok(())
    }

    /// Release the runtime now instead of at end of scope
    pub fn deinitialize(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.state != HandleState::Live {
            return;
        }
        self.state = HandleState::Deinitialized;
        self.library.deinitialize(self.raw);
        info!("Runtime deinitialized (handle {:#x})", self.raw);
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        if self.state == HandleState::Live {
            if std::thread::panicking() {
                warn!("Releasing runtime handle {:#x} during unwind", self.raw);
            } else {
                debug!("Releasing runtime handle {:#x} at end of scope", self.raw);
            }
        }
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::Mutex;

    /// Records every foreign call in order
    #[derive(Default)]
    struct Recorder {
        next_handle: RawHandle,
        calls: Mutex<Vec<String>>,
    }

    impl ForeignRuntime for Recorder {
        fn initialize(&self, base_dir: &CStr) -> RawHandle {
            self.calls
                .lock()
                .unwrap()
                .push(format!("init {}", base_dir.to_str().unwrap()));
            self.next_handle
        }

        fn run_script(&self, handle: RawHandle, source: &CStr) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("run {} {}", handle, source.to_str().unwrap()));
        }

        fn deinitialize(&self, handle: RawHandle) {
            self.calls.lock().unwrap().push(format!("deinit {}", handle));
        }

        fn hello(&self) -> HostResult<()> {
            Ok(())
        }
    }

    fn recorder(next_handle: RawHandle) -> Arc<Recorder> {
        Arc::new(Recorder {
            next_handle,
            ..Default::default()
        })
    }

    #[test]
    fn test_explicit_deinit_then_drop_releases_once() {
        let rec = recorder(7);
        let mut handle = RuntimeHandle::initialize(rec.clone(), Path::new("/app")).unwrap();
        assert_eq!(handle.state(), HandleState::Live);
        handle.run_script("1 + 1").unwrap();
        handle.deinitialize();

        assert_eq!(
            *rec.calls.lock().unwrap(),
            vec!["init /app", "run 7 1 + 1", "deinit 7"]
        );
    }

    #[test]
    fn test_drop_releases_live_handle() {
        let rec = recorder(3);
        {
            let _handle = RuntimeHandle::initialize(rec.clone(), Path::new("/app")).unwrap();
        }
        assert_eq!(*rec.calls.lock().unwrap(), vec!["init /app", "deinit 3"]);
    }

    #[test]
    fn test_negative_handle_is_a_sentinel() {
        let rec = recorder(-1);
        let err = RuntimeHandle::initialize(rec.clone(), Path::new("/app")).unwrap_err();
        assert!(matches!(
            err,
            HostError::InitializationFailure { handle: -1, .. }
        ));
        assert_eq!(*rec.calls.lock().unwrap(), vec!["init /app"]);
    }

    #[test]
    fn test_script_with_nul_never_reaches_runtime() {
        let rec = recorder(9);
        let mut handle = RuntimeHandle::initialize(rec.clone(), Path::new("/app")).unwrap();
        assert!(handle.run_script("a\0b").is_err());
        drop(handle);
        assert_eq!(*rec.calls.lock().unwrap(), vec!["init /app", "deinit 9"]);
    }

    #[test]
    fn test_drop_during_unwind_releases() {
        let rec = recorder(5);
        let rec_clone = rec.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _handle = RuntimeHandle::initialize(rec_clone, Path::new("/app")).unwrap();
            panic!("script host blew up");
        }));
        assert!(result.is_err());
        assert_eq!(*rec.calls.lock().unwrap(), vec!["init /app", "deinit 5"]);
    }
}
