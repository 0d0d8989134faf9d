//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → handed by value to the scheduler
//!
//! On file change:
//!     watcher.rs emits a ReloadTrigger (no payload)
//!     → supervisor re-reads through loader.rs
//!     → scheduler starts a new generation
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - A rejected reload leaves the running generation untouched
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{MonitorConfig, ObservabilityConfig, StorageConfig, TargetConfig};
pub use watcher::{ConfigWatcher, ReloadTrigger};
