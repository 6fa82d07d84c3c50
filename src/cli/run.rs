//! `nshost run`

use crate::config::HostConfig;
use crate::runtime::{ForeignRuntime, RunReport, RuntimeHost};
use crate::utils::errors::HostResult;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Run the configured entry script against an already loaded library
pub fn run_with(
    library: Arc<dyn ForeignRuntime>,
    base_dir: &Path,
    config: &HostConfig,
) -> HostResult<Vec<RunReport>> {
    let host = RuntimeHost::new(library, base_dir, &config.runtime.entry_script)?;
    info!(
        "Hosting {} from {} ({} cycle(s))",
        host.entry_path().display(),
        host.base_dir().display(),
        config.runtime.repeat
    );
    host.run(config.runtime.repeat)
}

/// Load the library from the configuration and run
pub fn execute(config: &HostConfig) -> HostResult<Vec<RunReport>> {
    let base_dir = super::base_dir(config)?;
    let library = super::load_library(config, &base_dir)?;
    run_with(library, &base_dir, config)
}
