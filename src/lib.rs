//! Backend reachability prober with hot-reloadable scheduling.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod scheduler;
pub mod storage;

pub use config::MonitorConfig;
pub use health::HealthState;
pub use lifecycle::Shutdown;
pub use scheduler::Scheduler;
