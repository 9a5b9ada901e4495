//! Application configuration

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use safenav_policy::{
    EngineConfig, FixedTimetable, PrayerPauseConfig, PrayerTimes, TimetablePrayerSource,
    DEFAULT_WHITELIST_TAG,
};

/// SafeNav configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// JSON file holding rules, settings, and audit logs
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Seconds between policy refreshes in `watch`
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// `blocked_by` text for strict-mode blocks
    #[serde(default = "default_whitelist_tag")]
    pub whitelist_tag: String,

    /// Prayer-time pauses
    #[serde(default)]
    pub prayer: PrayerConfig,
}

/// Prayer pause window plus the daily timetable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrayerConfig {
    #[serde(flatten)]
    pub pause: PrayerPauseConfig,

    /// Without a timetable nothing is paused
    #[serde(default)]
    pub timetable: Option<PrayerTimes>,
}

impl AppConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, store_override: Option<&Path>) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("reading config {config_path}"))?;
            serde_yaml::from_str(&content).with_context(|| format!("parsing config {config_path}"))?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(store) = store_override {
            config.store_path = store.to_path_buf();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be greater than zero");
        }
        if self.whitelist_tag.trim().is_empty() {
            bail!("whitelist_tag must not be empty");
        }
        if self.prayer.pause.enabled && self.prayer.timetable.is_none() {
            tracing::warn!("Prayer pauses enabled without a timetable, nothing will be paused");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            whitelist_tag: self.whitelist_tag.clone(),
        }
    }

    pub fn prayer_source(&self) -> TimetablePrayerSource<FixedTimetable> {
        TimetablePrayerSource::new(FixedTimetable::new(self.prayer.timetable), self.prayer.pause)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            refresh_interval_secs: default_refresh_interval(),
            whitelist_tag: default_whitelist_tag(),
            prayer: PrayerConfig::default(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("safenav-store.json")
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_whitelist_tag() -> String {
    DEFAULT_WHITELIST_TAG.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use safenav_core::{PrayerPause, PrayerPauseSource};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = AppConfig::load(path.to_str().unwrap(), None).unwrap();

        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.whitelist_tag, "whitelist_only");
        assert!(!config.prayer.pause.enabled);
        assert_eq!(config.prayer.pause.minutes_after, 15);
    }

    #[test]
    fn test_yaml_with_prayer_timetable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("safenav.yaml");
        std::fs::write(
            &path,
            r#"
store_path: /var/lib/safenav/store.json
refresh_interval_secs: 10
whitelist_tag: "Allowed sites only"
prayer:
  enabled: true
  minutes_before: 5
  timetable:
    fajr: "05:10"
    dhuhr: "12:30"
    asr: "15:45"
    maghrib: "18:20"
    isha: "19:50"
"#,
        )
        .unwrap();

        let override_path = PathBuf::from("/tmp/override.json");
        let config = AppConfig::load(path.to_str().unwrap(), Some(&override_path)).unwrap();

        assert_eq!(config.store_path, override_path);
        assert_eq!(config.refresh_interval_secs, 10);
        assert_eq!(config.engine_config().whitelist_tag, "Allowed sites only");
        assert!(config.prayer.pause.enabled);
        assert_eq!(config.prayer.pause.minutes_before, 5);
        assert_eq!(config.prayer.pause.minutes_after, 15);
        assert_eq!(
            config.prayer.timetable.unwrap().dhuhr,
            NaiveTime::from_hms_opt(12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("safenav.yaml");
        std::fs::write(&path, "refresh_interval_secs: 0\n").unwrap();
        assert!(AppConfig::load(path.to_str().unwrap(), None).is_err());
    }

    #[tokio::test]
    async fn test_prayer_source_from_config() {
        let mut config = AppConfig::default();
        config.prayer.pause.enabled = true;
        config.prayer.timetable = Some(PrayerTimes {
            fajr: NaiveTime::from_hms_opt(5, 10, 0).unwrap(),
            dhuhr: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            asr: NaiveTime::from_hms_opt(15, 45, 0).unwrap(),
            maghrib: NaiveTime::from_hms_opt(18, 20, 0).unwrap(),
            isha: NaiveTime::from_hms_opt(19, 50, 0).unwrap(),
        });

        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 40, 0)
            .unwrap();
        let pause = config.prayer_source().prayer_pause(now).await.unwrap();
        assert_eq!(pause, PrayerPause::paused("Dhuhr"));
    }
}
