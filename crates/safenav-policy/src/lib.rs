//! SafeNav Policy Engine
//!
//! Decides, for every navigation, whether a URL may load.
//!
//! A decision combines:
//! - Prayer-time pauses
//! - Weekly allowed-time schedules
//! - Strict-mode whitelisting or a domain blocklist
//! - Word-boundary keyword matching over the full URL
//!
//! Evaluation is synchronous and reads an immutable [`PolicySnapshot`];
//! the [`PolicyRefresher`] rebuilds that snapshot from storage in the
//! background.

pub mod domain;
pub mod engine;
pub mod guard;
pub mod keyword;
pub mod prayer;
pub mod refresh;
pub mod schedule;
pub mod snapshot;

pub use domain::{base_domain, matches_domain, matches_host, resolve_host};
pub use engine::{EngineConfig, PolicyEngine, DEFAULT_WHITELIST_TAG, PRAYER_FALLBACK_TAG};
pub use guard::{is_always_allowed, NavigationGuard};
pub use keyword::{matches_keyword, KeywordMatcher};
pub use prayer::{
    pause_status, FixedTimetable, PrayerPauseConfig, PrayerTimes, PrayerTimesProvider,
    TimetablePrayerSource,
};
pub use refresh::{PolicyRefresher, DEFAULT_REFRESH_INTERVAL};
pub use schedule::{is_navigation_allowed_by_schedule, TIME_RESTRICTION_TAG};
pub use snapshot::{PolicySnapshot, SnapshotCache};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::{EngineConfig, PolicyEngine};
    pub use crate::guard::NavigationGuard;
    pub use crate::refresh::PolicyRefresher;
    pub use crate::snapshot::{PolicySnapshot, SnapshotCache};
}
