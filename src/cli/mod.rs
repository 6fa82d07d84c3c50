//! CLI command implementations

pub mod args;
pub mod probe;
pub mod run;

use crate::config::{ConfigManager, HostConfig};
use crate::runtime::host::{executable_dir, resolve_base_dir};
use crate::runtime::NativeLibrary;
use crate::utils::errors::HostResult;
use args::Cli;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Get the default config path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("nshost/config.toml"))
        .unwrap_or_else(|| PathBuf::from("~/.config/nshost/config.toml"))
}

/// Expand tilde in path
pub fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

/// Load the layered config and apply CLI overrides
pub fn load_config(cli: &Cli) -> HostResult<HostConfig> {
    let path = match &cli.global.config {
        Some(path) => PathBuf::from(expand_path(path)),
        None => default_config_path(),
    };
    let mut config = ConfigManager::new(Some(path.as_path())).load()?;
    cli.apply_overrides(&mut config);
    ConfigManager::validate(&config)?;
    Ok(config)
}

/// Configured base directory, or the executable's directory
pub fn base_dir(config: &HostConfig) -> HostResult<PathBuf> {
    match &config.runtime.base_dir {
        // Non-UTF-8 paths skip tilde expansion rather than being altered
        Some(dir) => match dir.to_str() {
            Some(text) => resolve_base_dir(&PathBuf::from(expand_path(text))),
            None => resolve_base_dir(dir),
        },
        None => resolve_base_dir(&executable_dir()?),
    }
}

/// Load the runtime library named by the configuration
pub fn load_library(config: &HostConfig, base_dir: &Path) -> HostResult<Arc<NativeLibrary>> {
    let path = config.runtime.library_path(base_dir);
    NativeLibrary::load(&path).map(Arc::new)
}

/// `nshost config`
pub fn show_config(config: &HostConfig) -> HostResult<()> {
    let rendered = ConfigManager::to_toml(config)?;
    println!("{}", rendered);
    Ok(())
}
