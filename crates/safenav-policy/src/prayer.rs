//! Prayer pause windows
//!
//! A pause window spans `minutes_before` a prayer time to `minutes_after` it,
//! both ends inclusive, clamped to the same day. Prayer times themselves come
//! from a [`PrayerTimesProvider`]; without a timetable nothing is paused.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use safenav_core::{PrayerPause, PrayerPauseSource, Result};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// One day's prayer times, local wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimes {
    #[serde(with = "hhmm")]
    pub fajr: NaiveTime,
    #[serde(with = "hhmm")]
    pub dhuhr: NaiveTime,
    #[serde(with = "hhmm")]
    pub asr: NaiveTime,
    #[serde(with = "hhmm")]
    pub maghrib: NaiveTime,
    #[serde(with = "hhmm")]
    pub isha: NaiveTime,
}

impl PrayerTimes {
    /// Prayers in day order
    pub fn in_order(&self) -> [(&'static str, NaiveTime); 5] {
        [
            ("Fajr", self.fajr),
            ("Dhuhr", self.dhuhr),
            ("Asr", self.asr),
            ("Maghrib", self.maghrib),
            ("Isha", self.isha),
        ]
    }
}

/// Buffer around each prayer time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerPauseConfig {
    pub enabled: bool,
    pub minutes_before: u32,
    pub minutes_after: u32,
}

impl Default for PrayerPauseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            minutes_before: 0,
            minutes_after: 15,
        }
    }
}

/// Pause status at `now` for the given timetable
pub fn pause_status(times: &PrayerTimes, config: &PrayerPauseConfig, now: NaiveTime) -> PrayerPause {
    if !config.enabled {
        return PrayerPause::inactive();
    }

    let current = minute_of_day(now);
    let before = i64::from(config.minutes_before);
    let after = i64::from(config.minutes_after);

    times
        .in_order()
        .into_iter()
        .find(|(_, at)| {
            let at = minute_of_day(*at);
            let start = (at - before).max(0);
            let end = (at + after).min(MINUTES_PER_DAY - 1);
            start <= current && current <= end
        })
        .map(|(name, _)| PrayerPause::paused(name))
        .unwrap_or_default()
}

fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Supplies prayer times for a date
#[async_trait]
pub trait PrayerTimesProvider: Send + Sync {
    /// `None` when no location is configured
    async fn times_for(&self, date: NaiveDate) -> Result<Option<PrayerTimes>>;
}

/// The same timetable every day
#[derive(Debug, Clone, Default)]
pub struct FixedTimetable {
    times: Option<PrayerTimes>,
}

impl FixedTimetable {
    pub fn new(times: Option<PrayerTimes>) -> Self {
        Self { times }
    }
}

#[async_trait]
impl PrayerTimesProvider for FixedTimetable {
    async fn times_for(&self, _date: NaiveDate) -> Result<Option<PrayerTimes>> {
        Ok(self.times)
    }
}

/// [`PrayerPauseSource`] backed by a timetable provider
pub struct TimetablePrayerSource<P> {
    provider: P,
    config: PrayerPauseConfig,
}

impl<P: PrayerTimesProvider> TimetablePrayerSource<P> {
    pub fn new(provider: P, config: PrayerPauseConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &PrayerPauseConfig {
        &self.config
    }
}

#[async_trait]
impl<P: PrayerTimesProvider> PrayerPauseSource for TimetablePrayerSource<P> {
    async fn prayer_pause(&self, now: NaiveDateTime) -> Result<PrayerPause> {
        if !self.config.enabled {
            return Ok(PrayerPause::inactive());
        }

        match self.provider.times_for(now.date()).await? {
            Some(times) => Ok(pause_status(&times, &self.config, now.time())),
            None => Ok(PrayerPause::inactive()),
        }
    }
}

/// Serde helpers for "HH:MM" times
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(value.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
