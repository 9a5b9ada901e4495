//! SafeNav Telemetry
//!
//! Audit reporting, metrics, and statistics for SafeNav.
//!
//! Provides:
//! - A background audit writer that keeps storage off the navigation path
//! - Decision counters
//! - Summaries of the blocked-attempt log

pub mod audit;
pub mod metrics;
pub mod stats;

pub use audit::AuditService;
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use stats::{AuditStats, BlockedByCount};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::AuditService;
    pub use crate::metrics::MetricsCollector;
    pub use crate::stats::AuditStats;
}
