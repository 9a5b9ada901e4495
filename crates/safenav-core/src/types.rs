//! Core types for SafeNav

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Why a navigation was blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    /// Host matched a blocked domain
    Domain,
    /// URL contained a blocked keyword
    Keyword,
    /// Navigation suspended during a prayer window
    Prayer,
    /// Outside every allowed schedule window
    Schedule,
    /// Strict mode is on and the host is not whitelisted
    Whitelist,
}

impl BlockReason {
    /// Every reason, in evaluation order
    pub const ALL: [BlockReason; 5] = [
        BlockReason::Prayer,
        BlockReason::Schedule,
        BlockReason::Whitelist,
        BlockReason::Domain,
        BlockReason::Keyword,
    ];

    /// Stable code used in logs and audit records
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Domain => "domain",
            BlockReason::Keyword => "keyword",
            BlockReason::Prayer => "prayer",
            BlockReason::Schedule => "schedule",
            BlockReason::Whitelist => "whitelist",
        }
    }

    /// Key of the user-facing message shown on the blocked screen
    pub fn message_key(&self) -> &'static str {
        match self {
            BlockReason::Domain => "blocked.domain",
            BlockReason::Keyword => "blocked.keyword",
            BlockReason::Prayer => "blocked.prayer",
            BlockReason::Schedule => "blocked.schedule",
            BlockReason::Whitelist => "blocked.whitelist",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockReason {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "domain" => Ok(BlockReason::Domain),
            "keyword" => Ok(BlockReason::Keyword),
            "prayer" => Ok(BlockReason::Prayer),
            "schedule" => Ok(BlockReason::Schedule),
            "whitelist" => Ok(BlockReason::Whitelist),
            _ => Err(Error::invalid_input(format!("unknown block reason: {value}"))),
        }
    }
}

/// Outcome of evaluating one navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDecision {
    /// Whether navigation must be stopped
    pub blocked: bool,

    /// Reason code, present only when blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,

    /// The literal domain, keyword, prayer name, or rule tag that matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

impl BlockDecision {
    /// Navigation may proceed
    pub fn allow() -> Self {
        Self {
            blocked: false,
            reason: None,
            blocked_by: None,
        }
    }

    /// Navigation is blocked for `reason`, triggered by `blocked_by`
    pub fn block(reason: BlockReason, blocked_by: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason),
            blocked_by: Some(blocked_by.into()),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

/// How sensitive words are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentFilterMode {
    /// No in-page filtering
    Off,
    /// Matched text is obscured in-page; URL keyword blocking is skipped
    Blur,
    /// URL-level keyword blocking
    #[default]
    Block,
}

impl fmt::Display for ContentFilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ContentFilterMode::Off => "off",
            ContentFilterMode::Blur => "blur",
            ContentFilterMode::Block => "block",
        };
        f.write_str(value)
    }
}

impl FromStr for ContentFilterMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "off" => Ok(ContentFilterMode::Off),
            "blur" => Ok(ContentFilterMode::Blur),
            "block" => Ok(ContentFilterMode::Block),
            _ => Err(Error::invalid_input(format!(
                "unknown content filter mode: {value}"
            ))),
        }
    }
}

/// A (days, time range, allow/deny) tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRule {
    /// 0 = Sunday .. 6 = Saturday
    pub days_of_week: BTreeSet<u8>,

    pub is_allowed: bool,

    /// Zero-padded 24h "HH:MM"
    pub start_time: String,

    /// Zero-padded 24h "HH:MM", inclusive
    pub end_time: String,
}

impl ScheduleRule {
    /// Create an allow rule for the given days and window
    pub fn allow(
        days: impl IntoIterator<Item = u8>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            days_of_week: days.into_iter().collect(),
            is_allowed: true,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Check shape before a rule is persisted.
    ///
    /// The evaluator never calls this; stored rules are compared as-is.
    pub fn validate(&self) -> Result<()> {
        if self.days_of_week.is_empty() {
            return Err(Error::invalid_input("schedule rule has no days"));
        }
        if let Some(day) = self.days_of_week.iter().find(|d| **d > 6) {
            return Err(Error::invalid_input(format!(
                "day of week out of range (0-6): {day}"
            )));
        }
        for value in [&self.start_time, &self.end_time] {
            if !is_clock_time(value) {
                return Err(Error::invalid_input(format!(
                    "expected zero-padded HH:MM, got {value:?}"
                )));
            }
        }
        // Windows cannot span midnight
        if self.start_time > self.end_time {
            return Err(Error::invalid_input(format!(
                "start {} is after end {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

/// True for zero-padded 24h "HH:MM"
pub fn is_clock_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hour < 24 && minute < 60
}

/// Weekly browsing schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleData {
    pub enabled: bool,

    /// Parent-granted override that suspends the schedule
    pub temporary_override: bool,

    /// Ordered rules
    pub rules: Vec<ScheduleRule>,
}

impl ScheduleData {
    /// Whether any rule grants access
    pub fn has_allow_rules(&self) -> bool {
        self.rules.iter().any(|rule| rule.is_allowed)
    }
}

/// Prayer-time pause status at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrayerPause {
    pub is_paused: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_prayer: Option<String>,
}

impl PrayerPause {
    /// Paused for the named prayer
    pub fn paused(prayer: impl Into<String>) -> Self {
        Self {
            is_paused: true,
            active_prayer: Some(prayer.into()),
        }
    }

    /// Not paused
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// User-editable settings, merged over defaults on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub content_filter_mode: ContentFilterMode,

    /// Keep a browsing history log
    pub record_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            content_filter_mode: ContentFilterMode::default(),
            record_history: true,
        }
    }
}

/// Snapshot of everything the policy engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyInputs {
    /// Most recently added first
    pub blocked_domains: Vec<String>,

    /// Most recently added first
    pub blocked_keywords: Vec<String>,

    /// Only consulted when strict mode is enabled
    pub whitelist_domains: Vec<String>,

    pub strict_mode_enabled: bool,

    pub schedule: Option<ScheduleData>,

    pub content_filter_mode: ContentFilterMode,

    pub prayer_pause: PrayerPause,
}
