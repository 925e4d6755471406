mod config;
mod error;
mod policy;
mod registry;
mod sink;
pub mod staging;

pub use config::{DEFAULT_EVENTS_PER_FILE, DEFAULT_FILE_SIZE_KB, Format, SinkConfig};
pub use error::{Error, Result};
pub use policy::RotationPolicy;
pub use registry::SinkRegistry;
pub use sink::{FileSink, ensure_target_dir, resolve_target_dir};
pub use staging::STAGING_MARKER;
