use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    /// Loading and validating configuration
    Configure,
    /// Loading the native runtime library
    Load,
    /// `runtime_init` and everything it needs
    Initialize,
    /// Resolving and reading the entry script
    ReadScript,
    /// The `hello` diagnostic probe
    Probe,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Load => "load",
            Self::Initialize => "initialize",
            Self::ReadScript => "read_script",
            Self::Probe => "probe",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("failed to load runtime library {path}: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },

    #[error("runtime library does not export `{0}`")]
    MissingSymbol(&'static str),

    #[error("base directory {path} is not usable: {reason}")]
    BaseDirectory { path: PathBuf, reason: String },

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("{what} contains an interior NUL byte at offset {position}")]
    InteriorNul { what: &'static str, position: usize },

    #[error("COM apartment setup failed: HRESULT {0:#010x}")]
    ComApartment(i32),

    #[error("runtime_init returned invalid handle {handle} for {}", .base_dir.display())]
    InitializationFailure { base_dir: PathBuf, handle: i64 },

    #[error("entry script {} is unreadable: {reason}", .path.display())]
    EntryScriptUnreadable { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<figment::Error> for HostError {
    fn from(e: figment::Error) -> Self {
        HostError::Config(e.to_string())
    }
}

impl HostError {
    /// Stage of the host lifecycle that failed
    pub fn stage(&self) -> LifecycleStage {
        match self {
            Self::Config(_) => LifecycleStage::Configure,
            Self::LibraryLoad { .. } => LifecycleStage::Load,
            // `hello` is the only optional symbol, so a missing symbol after
            // load can only come from the probe.
            Self::MissingSymbol("hello") => LifecycleStage::Probe,
            Self::MissingSymbol(_) => LifecycleStage::Load,
            Self::BaseDirectory { .. }
            | Self::ComApartment(_)
            | Self::NonUtf8Path(_)
            | Self::InitializationFailure { .. } => LifecycleStage::Initialize,
            Self::InteriorNul { what, .. } if *what == "base directory" => {
                LifecycleStage::Initialize
            }
            Self::InteriorNul { .. } | Self::EntryScriptUnreadable { .. } => {
                LifecycleStage::ReadScript
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LibraryLoad { .. } => "LIBRARY_LOAD",
            Self::MissingSymbol(_) => "MISSING_SYMBOL",
            Self::BaseDirectory { .. } => "BASE_DIRECTORY",
            Self::NonUtf8Path(_) => "NON_UTF8_PATH",
            Self::InteriorNul { .. } => "INTERIOR_NUL",
            Self::ComApartment(_) => "COM_APARTMENT",
            Self::InitializationFailure { .. } => "INITIALIZATION_FAILURE",
            Self::EntryScriptUnreadable { .. } => "ENTRY_SCRIPT_UNREADABLE",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Process exit status for this failure (sysexits-style)
    pub fn exit_code(&self) -> i32 {
        match self.stage() {
            LifecycleStage::Configure => 78,
            LifecycleStage::Load | LifecycleStage::Probe => 69,
            LifecycleStage::Initialize => 70,
            LifecycleStage::ReadScript => 66,
        }
    }

    /// One-line diagnostic naming the failed stage
    pub fn diagnostic(&self) -> String {
        format!("error[{}] {} failed: {}", self.error_code(), self.stage(), self)
    }
}

pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_for_interior_nul_depends_on_subject() {
        let dir = HostError::InteriorNul { what: "base directory", position: 3 };
        let script = HostError::InteriorNul { what: "entry script", position: 0 };
        assert_eq!(dir.stage(), LifecycleStage::Initialize);
        assert_eq!(script.stage(), LifecycleStage::ReadScript);
    }

    #[test]
    fn test_missing_probe_symbol_is_a_probe_failure() {
        assert_eq!(HostError::MissingSymbol("hello").stage(), LifecycleStage::Probe);
        assert_eq!(
            HostError::MissingSymbol("runtime_init").stage(),
            LifecycleStage::Load
        );
    }

    #[test]
    fn test_diagnostic_format() {
        let err = HostError::InitializationFailure {
            base_dir: PathBuf::from("/app"),
            handle: 0,
        };
        assert_eq!(
            err.diagnostic(),
            "error[INITIALIZATION_FAILURE] initialize failed: runtime_init returned invalid handle 0 for /app"
        );
    }
}
