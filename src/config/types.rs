use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use validator::{Validate, ValidationError};

/// Relative location of the entry script inside the base directory
pub const DEFAULT_ENTRY_SCRIPT: &str = "App/main.js";

/// Directory (relative to the base directory) holding the runtime library
pub const DEFAULT_LIBRARY_DIR: &str = "libs";

/// Stem of the runtime library file name, before platform decoration
pub const DEFAULT_LIBRARY_STEM: &str = "nativescript";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    #[validate(nested)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct RuntimeSection {
    /// Directory handed to `runtime_init`; defaults to the executable's directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// Runtime library path; relative paths resolve against `base_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,
    /// Entry script, relative to `base_dir`
    #[validate(custom(function = "validate_entry_script"))]
    pub entry_script: PathBuf,
    /// Number of full init/run/deinit cycles
    #[validate(range(min = 1))]
    pub repeat: u32,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            base_dir: None,
            library: None,
            entry_script: PathBuf::from(DEFAULT_ENTRY_SCRIPT),
            repeat: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    #[validate(length(min = 1))]
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Entry script must stay inside the base directory
fn validate_entry_script(path: &PathBuf) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::new("empty_entry_script"));
    }
    if path.is_absolute() || path.has_root() {
        return Err(ValidationError::new("entry_script_not_relative"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ValidationError::new("entry_script_escapes_base_dir"));
    }
    Ok(())
}

impl RuntimeSection {
    /// Platform file name of the default runtime library
    pub fn default_library_file() -> PathBuf {
        Path::new(DEFAULT_LIBRARY_DIR).join(libloading::library_filename(DEFAULT_LIBRARY_STEM))
    }

    /// Library path resolved against `base_dir`
    pub fn library_path(&self, base_dir: &Path) -> PathBuf {
        let library = self
            .library
            .clone()
            .unwrap_or_else(Self::default_library_file);
        if library.is_absolute() {
            library
        } else {
            base_dir.join(library)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runtime.entry_script, PathBuf::from("App/main.js"));
        assert_eq!(config.runtime.repeat, 1);
    }

    #[test]
    fn test_entry_script_rules() {
        assert!(validate_entry_script(&PathBuf::from("App/main.js")).is_ok());
        assert!(validate_entry_script(&PathBuf::new()).is_err());
        assert!(validate_entry_script(&PathBuf::from("/etc/passwd")).is_err());
        assert!(validate_entry_script(&PathBuf::from("App/../../secret.js")).is_err());
    }

    #[test]
    fn test_library_path_resolution() {
        let mut section = RuntimeSection::default();
        let base = Path::new("/app");

        let default = section.library_path(base);
        assert!(default.starts_with("/app/libs"));
        assert!(default
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("nativescript")));

        section.library = Some(PathBuf::from("custom/librt.so"));
        assert_eq!(section.library_path(base), PathBuf::from("/app/custom/librt.so"));

        section.library = Some(PathBuf::from("/opt/rt/librt.so"));
        assert_eq!(section.library_path(base), PathBuf::from("/opt/rt/librt.so"));
    }
}
