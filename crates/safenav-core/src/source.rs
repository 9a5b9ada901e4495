//! Collaborator interfaces around the policy core
//!
//! Inbound reads come from the persistent store and the prayer-time
//! service; outbound audit writes go back to the store. The policy engine
//! never calls any of these directly: the refresher reads, the navigation
//! guard reports.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::Result;
use crate::records::{BlockedAttempt, HistoryEntry};
use crate::types::{BlockReason, PrayerPause, ScheduleData, Settings};

/// Source of the user-maintained policy lists and settings
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn blocked_domains(&self) -> Result<Vec<String>>;

    async fn blocked_keywords(&self) -> Result<Vec<String>>;

    async fn whitelist_domains(&self) -> Result<Vec<String>>;

    async fn strict_mode_enabled(&self) -> Result<bool>;

    /// `None` when no schedule has ever been saved
    async fn schedule(&self) -> Result<Option<ScheduleData>>;

    async fn settings(&self) -> Result<Settings>;
}

/// Source of the current prayer pause status
#[async_trait]
pub trait PrayerPauseSource: Send + Sync {
    /// Pause status at local wall-clock time `now`
    async fn prayer_pause(&self, now: NaiveDateTime) -> Result<PrayerPause>;
}

/// Never paused; used when prayer pausing is not configured
pub struct NoPrayerPause;

#[async_trait]
impl PrayerPauseSource for NoPrayerPause {
    async fn prayer_pause(&self, _now: NaiveDateTime) -> Result<PrayerPause> {
        Ok(PrayerPause::inactive())
    }
}

/// Durable, append-only audit storage
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append_blocked_attempt(&self, attempt: BlockedAttempt) -> Result<()>;

    async fn append_history(&self, entry: HistoryEntry) -> Result<()>;
}

/// Best-effort audit reporting from the navigation path.
///
/// Implementations must not block the caller; failures are swallowed.
pub trait AuditReporter: Send + Sync {
    fn log_blocked_attempt(&self, url: &str, reason: BlockReason, blocked_by: &str);

    fn log_navigation(
        &self,
        url: &str,
        title: &str,
        was_blocked: bool,
        reason: Option<BlockReason>,
        blocked_by: Option<&str>,
    );
}
