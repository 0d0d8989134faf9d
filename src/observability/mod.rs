//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Check loops, scheduler, recorder produce:
//!     → logging.rs (structured log events keyed by target identity)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
