//! SafeNav Core
//!
//! Core types, traits, and utilities shared across SafeNav components.
//!
//! This crate provides:
//! - The policy input snapshot and schedule data model
//! - Block decisions with a closed set of reason codes
//! - Audit records (blocked attempts, browsing history)
//! - Collaborator traits for stores, prayer-time sources, and audit reporting
//! - Error types and result handling

pub mod error;
pub mod records;
pub mod source;
pub mod types;

pub use error::{Error, Result};
pub use records::{BlockedAttempt, HistoryEntry};
pub use source::{AuditReporter, AuditSink, NoPrayerPause, PolicySource, PrayerPauseSource};
pub use types::{
    BlockDecision, BlockReason, ContentFilterMode, PolicyInputs, PrayerPause, ScheduleData,
    ScheduleRule, Settings,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        BlockDecision, BlockReason, ContentFilterMode, PolicyInputs, PrayerPause, ScheduleData,
        ScheduleRule,
    };
}
