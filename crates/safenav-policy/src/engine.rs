//! Policy evaluation engine

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use safenav_core::{BlockDecision, BlockReason, ContentFilterMode};

use crate::domain::{matches_host, resolve_host};
use crate::schedule::{is_navigation_allowed_by_schedule, TIME_RESTRICTION_TAG};
use crate::snapshot::PolicySnapshot;

/// `blocked_by` for a prayer pause with no prayer name
pub const PRAYER_FALLBACK_TAG: &str = "prayer";

/// Default `blocked_by` for strict-mode blocks
pub const DEFAULT_WHITELIST_TAG: &str = "whitelist_only";

/// Engine settings that do not change between refreshes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Localized tag reported for strict-mode blocks
    #[serde(default = "default_whitelist_tag")]
    pub whitelist_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            whitelist_tag: default_whitelist_tag(),
        }
    }
}

fn default_whitelist_tag() -> String {
    DEFAULT_WHITELIST_TAG.to_string()
}

/// Policy evaluation engine.
///
/// Stateless and synchronous: it performs no I/O and holds nothing between
/// calls, so it can run inline on every navigation event.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    config: EngineConfig,
}

impl PolicyEngine {
    /// Create a new policy engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit settings
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `url` against `snapshot` at the current local time
    pub fn evaluate(&self, url: &str, snapshot: &PolicySnapshot) -> BlockDecision {
        self.evaluate_at(url, snapshot, Local::now().naive_local())
    }

    /// Evaluate `url` against `snapshot` at local wall-clock time `now`.
    ///
    /// Checks run in a fixed order and the first block wins:
    /// prayer pause, schedule, strict-mode whitelist or domain blocklist,
    /// then keywords.
    pub fn evaluate_at(&self, url: &str, snapshot: &PolicySnapshot, now: NaiveDateTime) -> BlockDecision {
        let inputs = snapshot.inputs();

        if inputs.prayer_pause.is_paused {
            let prayer = inputs
                .prayer_pause
                .active_prayer
                .as_deref()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(PRAYER_FALLBACK_TAG);
            debug!(url = %url, prayer = %prayer, "Navigation paused for prayer");
            return BlockDecision::block(BlockReason::Prayer, prayer);
        }

        if let Some(schedule) = &inputs.schedule {
            if !is_navigation_allowed_by_schedule(schedule, now) {
                debug!(url = %url, "Navigation outside allowed schedule");
                return BlockDecision::block(BlockReason::Schedule, TIME_RESTRICTION_TAG);
            }
        }

        let host = resolve_host(url);

        // Whitelist and blocklist are exclusive domain policies
        if inputs.strict_mode_enabled {
            let whitelisted = host
                .as_deref()
                .is_some_and(|host| matches_host(host, &inputs.whitelist_domains).is_some());
            if !whitelisted {
                debug!(url = %url, host = ?host, "Host not whitelisted in strict mode");
                return BlockDecision::block(BlockReason::Whitelist, self.config.whitelist_tag.as_str());
            }
        } else if let Some(host) = host.as_deref() {
            if let Some(rule) = matches_host(host, &inputs.blocked_domains) {
                debug!(url = %url, rule = %rule, "Blocked domain");
                return BlockDecision::block(BlockReason::Domain, rule);
            }
        }

        // Blur mode leaves sensitive words to the in-page filter
        if inputs.content_filter_mode != ContentFilterMode::Blur {
            if let Some(keyword) = snapshot.keywords().find(url) {
                debug!(url = %url, keyword = %keyword, "Blocked keyword");
                return BlockDecision::block(BlockReason::Keyword, keyword);
            }
        }

        BlockDecision::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use safenav_core::{PolicyInputs, PrayerPause, ScheduleData, ScheduleRule};

    fn noon_monday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn base_inputs() -> PolicyInputs {
        PolicyInputs {
            blocked_domains: vec!["blocked.example".to_string()],
            blocked_keywords: vec!["casino".to_string()],
            whitelist_domains: vec!["wikipedia.org".to_string()],
            ..Default::default()
        }
    }

    fn evaluate(url: &str, inputs: PolicyInputs) -> BlockDecision {
        PolicyEngine::new().evaluate_at(url, &PolicySnapshot::new(inputs), noon_monday())
    }

    #[test]
    fn test_allow_when_nothing_matches() {
        assert_eq!(evaluate("https://kids.example", base_inputs()), BlockDecision::allow());
    }

    #[test]
    fn test_domain_block() {
        let decision = evaluate("https://blocked.example/page", base_inputs());
        assert_eq!(decision, BlockDecision::block(BlockReason::Domain, "blocked.example"));
    }

    #[test]
    fn test_prayer_fallback_tag() {
        let mut inputs = base_inputs();
        inputs.prayer_pause = PrayerPause {
            is_paused: true,
            active_prayer: None,
        };
        let decision = evaluate("https://kids.example", inputs);
        assert_eq!(decision, BlockDecision::block(BlockReason::Prayer, "prayer"));
    }

    #[test]
    fn test_schedule_before_strict_mode() {
        let mut inputs = base_inputs();
        inputs.strict_mode_enabled = true;
        inputs.schedule = Some(ScheduleData {
            enabled: true,
            temporary_override: false,
            rules: vec![ScheduleRule::allow([0], "08:00", "09:00")],
        });
        let decision = evaluate("https://unknown.example", inputs);
        assert_eq!(decision, BlockDecision::block(BlockReason::Schedule, "time_restriction"));
    }

    #[test]
    fn test_custom_whitelist_tag() {
        let mut inputs = base_inputs();
        inputs.strict_mode_enabled = true;
        let engine = PolicyEngine::with_config(EngineConfig {
            whitelist_tag: "Allowed sites only".to_string(),
        });
        let decision = engine.evaluate_at("https://kids.example", &PolicySnapshot::new(inputs), noon_monday());
        assert_eq!(decision, BlockDecision::block(BlockReason::Whitelist, "Allowed sites only"));
    }

    #[test]
    fn test_keyword_checked_under_strict_mode() {
        let mut inputs = base_inputs();
        inputs.strict_mode_enabled = true;
        let decision = evaluate("https://en.wikipedia.org/wiki/Casino", inputs);
        assert_eq!(decision, BlockDecision::block(BlockReason::Keyword, "casino"));
    }

    #[test]
    fn test_off_mode_still_blocks_keywords() {
        let mut inputs = base_inputs();
        inputs.content_filter_mode = ContentFilterMode::Off;
        let decision = evaluate("https://kids.example/casino", inputs);
        assert_eq!(decision.reason, Some(BlockReason::Keyword));
    }

    #[test]
    fn test_engine_config_yaml_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.whitelist_tag, DEFAULT_WHITELIST_TAG);
    }
}
