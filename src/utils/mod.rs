pub mod errors;
pub mod tracing;

pub use errors::{HostError, HostResult, LifecycleStage};
