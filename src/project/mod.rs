pub mod config;
pub mod host;

pub use config::{ConfigError, RuntimeConfig};
pub use host::{BundledHost, FileSystemHost, HostError, MemoryHost, ModuleHost, SourceFile};
