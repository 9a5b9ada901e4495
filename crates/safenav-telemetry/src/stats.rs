//! Summaries over the blocked-attempt log

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use safenav_core::{BlockReason, BlockedAttempt};

/// How many `blocked_by` values [`AuditStats`] keeps
pub const TOP_BLOCKED_BY: usize = 10;

/// A rule and how often it fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedByCount {
    pub blocked_by: String,
    pub count: usize,
}

/// Audit statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total: usize,
    pub by_reason: BTreeMap<BlockReason, usize>,
    pub last_24h: usize,
    /// Most frequent first, ties by name
    pub top_blocked_by: Vec<BlockedByCount>,
}

impl AuditStats {
    pub fn from_attempts(attempts: &[BlockedAttempt], now: DateTime<Utc>) -> Self {
        let since = now - Duration::hours(24);
        let mut by_reason = BTreeMap::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut last_24h = 0;

        for attempt in attempts {
            *by_reason.entry(attempt.reason).or_insert(0) += 1;
            *counts.entry(attempt.blocked_by.as_str()).or_insert(0) += 1;
            if attempt.timestamp >= since && attempt.timestamp <= now {
                last_24h += 1;
            }
        }

        let mut top_blocked_by: Vec<BlockedByCount> = counts
            .into_iter()
            .map(|(blocked_by, count)| BlockedByCount {
                blocked_by: blocked_by.to_string(),
                count,
            })
            .collect();
        top_blocked_by.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.blocked_by.cmp(&b.blocked_by)));
        top_blocked_by.truncate(TOP_BLOCKED_BY);

        Self {
            total: attempts.len(),
            by_reason,
            last_24h,
            top_blocked_by,
        }
    }
}
