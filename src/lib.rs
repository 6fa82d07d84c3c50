//! nshost: lifecycle-safe host for an embedded native scripting runtime

pub mod cli;
pub mod config;
pub mod runtime;
pub mod utils;

pub use config::HostConfig;
pub use utils::errors::{HostError, HostResult};
