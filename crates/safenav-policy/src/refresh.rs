//! Background policy refresh
//!
//! Reads every policy input from a [`PolicySource`] concurrently, builds a
//! new [`PolicySnapshot`], and swaps it into the shared [`SnapshotCache`].
//! A failed store read leaves the previous snapshot in place.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use safenav_core::{PolicyInputs, PolicySource, PrayerPause, PrayerPauseSource, Result};

use crate::snapshot::{PolicySnapshot, SnapshotCache};

/// How often the refresher re-reads storage by default
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Rebuilds the policy snapshot from storage
pub struct PolicyRefresher {
    source: Arc<dyn PolicySource>,
    prayer: Arc<dyn PrayerPauseSource>,
    cache: Arc<SnapshotCache>,
    interval: Duration,
}

impl PolicyRefresher {
    pub fn new(
        source: Arc<dyn PolicySource>,
        prayer: Arc<dyn PrayerPauseSource>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            source,
            prayer,
            cache,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Set the period used by [`PolicyRefresher::spawn`]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Refresh now, using the current local time for the prayer check
    pub async fn refresh_once(&self) -> Result<Arc<PolicySnapshot>> {
        self.refresh_at(Local::now().naive_local()).await
    }

    /// Read all inputs and replace the cached snapshot.
    ///
    /// Store errors are returned and the cache is left untouched. A failing
    /// prayer source is treated as "not paused".
    pub async fn refresh_at(&self, now: NaiveDateTime) -> Result<Arc<PolicySnapshot>> {
        let (domains, keywords, whitelist, strict, schedule, settings, prayer) = tokio::join!(
            self.source.blocked_domains(),
            self.source.blocked_keywords(),
            self.source.whitelist_domains(),
            self.source.strict_mode_enabled(),
            self.source.schedule(),
            self.source.settings(),
            self.prayer.prayer_pause(now),
        );

        let prayer_pause = prayer.unwrap_or_else(|e| {
            warn!(error = %e, "Prayer pause lookup failed, treating as not paused");
            PrayerPause::inactive()
        });

        let inputs = PolicyInputs {
            blocked_domains: domains?,
            blocked_keywords: keywords?,
            whitelist_domains: whitelist?,
            strict_mode_enabled: strict?,
            schedule: schedule?,
            content_filter_mode: settings?.content_filter_mode,
            prayer_pause,
        };

        let snapshot = self.cache.replace_inputs(inputs);
        let inputs = snapshot.inputs();
        info!(
            domains = inputs.blocked_domains.len(),
            keywords = snapshot.keywords().len(),
            whitelist = inputs.whitelist_domains.len(),
            strict = inputs.strict_mode_enabled,
            paused = inputs.prayer_pause.is_paused,
            refreshed_at = %snapshot.refreshed_at(),
            "Policy snapshot refreshed"
        );
        if snapshot.keywords().substring_fallbacks() > 0 {
            warn!(
                count = snapshot.keywords().substring_fallbacks(),
                "Some keywords use substring matching"
            );
        }

        Ok(snapshot)
    }

    /// Refresh on a fixed period until the task is aborted.
    ///
    /// The first tick fires immediately.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh_once().await {
                    warn!(error = %e, "Policy refresh failed, keeping previous snapshot");
                } else {
                    debug!("Policy refresh tick complete");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use safenav_core::{ContentFilterMode, Error, NoPrayerPause, ScheduleData, Settings};

    #[derive(Default)]
    struct MockSource {
        domains: Mutex<Vec<String>>,
        fail: Mutex<bool>,
    }

    impl MockSource {
        fn check(&self) -> Result<()> {
            if *self.fail.lock() {
                Err(Error::store("disk unavailable"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PolicySource for MockSource {
        async fn blocked_domains(&self) -> Result<Vec<String>> {
            self.check()?;
            Ok(self.domains.lock().clone())
        }

        async fn blocked_keywords(&self) -> Result<Vec<String>> {
            Ok(vec!["casino".to_string()])
        }

        async fn whitelist_domains(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn strict_mode_enabled(&self) -> Result<bool> {
            Ok(false)
        }

        async fn schedule(&self) -> Result<Option<ScheduleData>> {
            Ok(None)
        }

        async fn settings(&self) -> Result<Settings> {
            Ok(Settings {
                content_filter_mode: ContentFilterMode::Blur,
                record_history: true,
            })
        }
    }

    struct FailingPrayer;

    #[async_trait]
    impl PrayerPauseSource for FailingPrayer {
        async fn prayer_pause(&self, _now: NaiveDateTime) -> Result<PrayerPause> {
            Err(Error::internal("timetable offline"))
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_refresh_builds_snapshot() {
        let source = Arc::new(MockSource::default());
        source.domains.lock().push("example.com".to_string());
        let cache = Arc::new(SnapshotCache::default());
        let refresher = PolicyRefresher::new(source, Arc::new(NoPrayerPause), cache.clone());

        let snapshot = refresher.refresh_at(now()).await.unwrap();
        assert_eq!(snapshot.inputs().blocked_domains, vec!["example.com"]);
        assert_eq!(snapshot.inputs().content_filter_mode, ContentFilterMode::Blur);
        assert_eq!(snapshot.keywords().len(), 1);
        assert!(Arc::ptr_eq(&snapshot, &cache.current()));
    }

    #[tokio::test]
    async fn test_store_failure_keeps_previous_snapshot() {
        let source = Arc::new(MockSource::default());
        source.domains.lock().push("example.com".to_string());
        let cache = Arc::new(SnapshotCache::default());
        let refresher = PolicyRefresher::new(source.clone(), Arc::new(NoPrayerPause), cache.clone());

        let first = refresher.refresh_at(now()).await.unwrap();
        *source.fail.lock() = true;

        assert!(refresher.refresh_at(now()).await.is_err());
        assert!(Arc::ptr_eq(&first, &cache.current()));
    }

    #[tokio::test]
    async fn test_prayer_failure_is_not_paused() {
        let source = Arc::new(MockSource::default());
        let cache = Arc::new(SnapshotCache::default());
        let refresher = PolicyRefresher::new(source, Arc::new(FailingPrayer), cache);

        let snapshot = refresher.refresh_at(now()).await.unwrap();
        assert!(!snapshot.inputs().prayer_pause.is_paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_refresher_picks_up_changes() {
        let source = Arc::new(MockSource::default());
        let cache = Arc::new(SnapshotCache::default());
        let handle = PolicyRefresher::new(source.clone(), Arc::new(NoPrayerPause), cache.clone())
            .with_interval(Duration::from_secs(5))
            .spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.current().inputs().blocked_domains.is_empty());

        source.domains.lock().push("example.com".to_string());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(cache.current().inputs().blocked_domains, vec!["example.com"]);

        handle.abort();
    }
}
