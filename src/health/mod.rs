//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active checks (active.rs):
//!     Periodic timer per target
//!     → Prober::check(deadline)
//!     → StatusRecorder::record_status(identity, state)
//!
//! State (state.rs):
//!     Normal ←→ Abnormal
//!     Only transitions are persisted
//! ```
//!
//! # Design Decisions
//! - One loop per (generation, target); loops are never reused
//! - A failed check is logged and recorded, never fatal to the loop
//! - Ticks of one target are strictly sequential

pub mod active;
pub mod state;

pub use active::{CheckLoop, LoopSettings};
pub use state::HealthState;
