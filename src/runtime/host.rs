//! Runtime host: drives full init/read/run/deinit cycles

use super::apartment::ComApartment;
use super::ffi::{ForeignRuntime, RawHandle};
use super::handle::RuntimeHandle;
use crate::utils::errors::{HostError, HostResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};

/// Entry script resolved against the base directory and read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryScript {
    pub path: PathBuf,
    pub source: String,
}

impl EntryScript {
    /// Absolute path of `relative` inside `base_dir`
    pub fn resolve(base_dir: &Path, relative: &Path) -> PathBuf {
        base_dir.join(relative)
    }

    /// Read the whole file, requiring valid UTF-8. The text is kept
    /// byte-for-byte: no BOM stripping, no newline translation.
    pub fn read(path: &Path) -> HostResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| HostError::EntryScriptUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let source = String::from_utf8(bytes).map_err(|e| HostError::EntryScriptUnreadable {
            path: path.to_path_buf(),
            reason: format!("not valid UTF-8: {}", e.utf8_error()),
        })?;

        debug!("Read entry script {} ({} bytes)", path.display(), source.len());
        Ok(Self {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub cycle: u32,
    pub handle: RawHandle,
    pub script: PathBuf,
    pub bytes: usize,
    pub elapsed: Duration,
}

/// Owns the runtime library and the paths a cycle needs
pub struct RuntimeHost {
    library: Arc<dyn ForeignRuntime>,
    base_dir: PathBuf,
    entry_script: PathBuf,
}

impl std::fmt::Debug for RuntimeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHost")
            .field("base_dir", &self.base_dir)
            .field("entry_script", &self.entry_script)
            .finish_non_exhaustive()
    }
}

impl RuntimeHost {
    /// `base_dir` must be an existing directory; it is made absolute here
    pub fn new(
        library: Arc<dyn ForeignRuntime>,
        base_dir: &Path,
        entry_script: impl Into<PathBuf>,
    ) -> HostResult<Self> {
        let base_dir = resolve_base_dir(base_dir)?;
        Ok(Self {
            library,
            base_dir,
            entry_script: entry_script.into(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute path of the entry script
    pub fn entry_path(&self) -> PathBuf {
        EntryScript::resolve(&self.base_dir, &self.entry_script)
    }

    /// One full lifecycle. The handle is released on every path out of
    /// this function once `runtime_init` has succeeded, and always before
    /// the thread leaves its COM apartment.
    pub fn run_once(&self, cycle: u32) -> HostResult<RunReport> {
        let span = info_span!("cycle", n = cycle);
        let _enter = span.enter();
        let started = Instant::now();

        // Declared before the handle so it drops after it.
        let _apartment = ComApartment::enter()?;
        let mut handle = RuntimeHandle::initialize(self.library.clone(), &self.base_dir)?;
        let raw = handle.raw();

        let script = EntryScript::read(&self.entry_path())?;

        info!("Running {}", script.path.display());
        handle.run_script(&script.source)?;
        handle.deinitialize();

        let report = RunReport {
            cycle,
            handle: raw,
            script: script.path,
            bytes: script.source.len(),
            elapsed: started.elapsed(),
        };
        info!("Cycle finished in {:?}", report.elapsed);
        Ok(report)
    }

    /// `repeat` independent cycles; stops at the first failure
    pub fn run(&self, repeat: u32) -> HostResult<Vec<RunReport>> {
        (1..=repeat).map(|cycle| self.run_once(cycle)).collect()
    }

    /// Call the `hello` diagnostic probe
    pub fn probe(&self) -> HostResult<()> {
        self.library.hello()?;
        info!("Runtime probe succeeded");
        Ok(())
    }
}

/// Canonical absolute form of the base directory.
///
/// On Windows this is a plain `C:\...` path, never the `\\?\` verbatim
/// form, since the text is handed to the runtime as-is.
pub fn resolve_base_dir(path: &Path) -> HostResult<PathBuf> {
    let canonical = dunce::canonicalize(path).map_err(|e| HostError::BaseDirectory {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !canonical.is_dir() {
        return Err(HostError::BaseDirectory {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(canonical)
}

/// Directory of the running executable
pub fn executable_dir() -> HostResult<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| HostError::BaseDirectory {
        path: PathBuf::from("<current executable>"),
        reason: e.to_string(),
    })?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| HostError::BaseDirectory {
            path: exe.clone(),
            reason: "executable has no parent directory".to_string(),
        })
}
