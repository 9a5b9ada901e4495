//! Time-of-day schedule evaluation

use chrono::{Datelike, NaiveDateTime, Timelike};
use safenav_core::ScheduleData;

/// `blocked_by` tag for schedule blocks
pub const TIME_RESTRICTION_TAG: &str = "time_restriction";

/// Whether browsing is permitted at `now` under `schedule`.
///
/// A schedule without any allow-rule never restricts browsing, even when
/// enabled: deny-only or empty schedules are open.
pub fn is_navigation_allowed_by_schedule(schedule: &ScheduleData, now: NaiveDateTime) -> bool {
    if !schedule.enabled || schedule.temporary_override {
        return true;
    }

    if !schedule.has_allow_rules() {
        return true;
    }

    let current_day = now.weekday().num_days_from_sunday() as u8;
    let current_time = clock_string(&now);

    // Zero-padded HH:MM compares lexicographically in chronological order
    schedule.rules.iter().filter(|rule| rule.is_allowed).any(|rule| {
        rule.days_of_week.contains(&current_day)
            && rule.start_time.as_str() <= current_time.as_str()
            && current_time.as_str() <= rule.end_time.as_str()
    })
}

/// Zero-padded 24h "HH:MM" of `now`
pub fn clock_string(now: &NaiveDateTime) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use safenav_core::ScheduleRule;

    // 2024-03-04 is a Monday (day 1)
    fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn weekday_schedule() -> ScheduleData {
        ScheduleData {
            enabled: true,
            temporary_override: false,
            rules: vec![ScheduleRule::allow([1, 2, 3, 4, 5], "08:00", "20:00")],
        }
    }

    #[test]
    fn test_disabled_schedule_allows() {
        let mut schedule = weekday_schedule();
        schedule.enabled = false;
        assert!(is_navigation_allowed_by_schedule(&schedule, monday_at(23, 0)));
    }

    #[test]
    fn test_override_allows() {
        let mut schedule = weekday_schedule();
        schedule.temporary_override = true;
        assert!(is_navigation_allowed_by_schedule(&schedule, monday_at(23, 0)));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let schedule = weekday_schedule();
        assert!(is_navigation_allowed_by_schedule(&schedule, monday_at(8, 0)));
        assert!(is_navigation_allowed_by_schedule(&schedule, monday_at(20, 0)));
        assert!(!is_navigation_allowed_by_schedule(&schedule, monday_at(7, 59)));
        assert!(!is_navigation_allowed_by_schedule(&schedule, monday_at(20, 1)));
    }

    #[test]
    fn test_seconds_are_ignored() {
        let schedule = weekday_schedule();
        let late = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(20, 0, 59)
            .unwrap();
        assert!(is_navigation_allowed_by_schedule(&schedule, late));
    }

    #[test]
    fn test_other_day_blocked() {
        let schedule = weekday_schedule();
        // 2024-03-03 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(!is_navigation_allowed_by_schedule(&schedule, sunday));
    }

    #[test]
    fn test_no_allow_rules_fails_open() {
        let empty = ScheduleData {
            enabled: true,
            temporary_override: false,
            rules: vec![],
        };
        assert!(is_navigation_allowed_by_schedule(&empty, monday_at(3, 0)));

        let mut deny = ScheduleRule::allow([1], "00:00", "23:59");
        deny.is_allowed = false;
        let deny_only = ScheduleData {
            enabled: true,
            temporary_override: false,
            rules: vec![deny],
        };
        assert!(is_navigation_allowed_by_schedule(&deny_only, monday_at(3, 0)));
    }

    #[test]
    fn test_deny_rules_are_not_consulted() {
        let mut deny = ScheduleRule::allow([1], "10:00", "11:00");
        deny.is_allowed = false;
        let schedule = ScheduleData {
            enabled: true,
            temporary_override: false,
            rules: vec![deny, ScheduleRule::allow([1], "09:00", "12:00")],
        };
        assert!(is_navigation_allowed_by_schedule(&schedule, monday_at(10, 30)));
    }

    #[test]
    fn test_any_allow_rule_suffices() {
        let schedule = ScheduleData {
            enabled: true,
            temporary_override: false,
            rules: vec![
                ScheduleRule::allow([1], "07:00", "08:00"),
                ScheduleRule::allow([1], "16:00", "18:00"),
            ],
        };
        assert!(is_navigation_allowed_by_schedule(&schedule, monday_at(17, 0)));
        assert!(!is_navigation_allowed_by_schedule(&schedule, monday_at(12, 0)));
    }

    #[test]
    fn test_clock_string_zero_padded() {
        assert_eq!(clock_string(&monday_at(7, 5)), "07:05");
    }
}
