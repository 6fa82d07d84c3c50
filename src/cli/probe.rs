//! `nshost probe`

use crate::config::HostConfig;
use crate::runtime::ForeignRuntime;
use crate::utils::errors::HostResult;

/// Load the library and call `hello` without creating a runtime
pub fn execute(config: &HostConfig) -> HostResult<()> {
    let base_dir = super::base_dir(config)?;
    let library = super::load_library(config, &base_dir)?;
    library.hello()?;
    println!("{}: ok", library.path().display());
    Ok(())
}
