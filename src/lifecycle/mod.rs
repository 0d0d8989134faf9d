//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Connect status store → Start generation 0
//!
//! Running (reload.rs):
//!     ReloadTrigger (file watcher or SIGHUP)
//!     → re-read config → Scheduler::reload
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → cancel current generation → drain → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast at startup; after startup only per-target errors occur
//! - A bad config on reload never stops the running generation

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use reload::{ReloadOutcome, Supervisor, SupervisorReport};
pub use shutdown::Shutdown;
pub use signals::spawn_signal_handler;
pub use startup::{bootstrap, StartupError};
