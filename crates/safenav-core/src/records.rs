//! Audit records written after a decision

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::BlockReason;

/// A navigation that the policy stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedAttempt {
    pub id: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub reason: BlockReason,
    pub blocked_by: String,
}

impl BlockedAttempt {
    /// Create a record stamped with the current time
    pub fn new(url: impl Into<String>, reason: BlockReason, blocked_by: impl Into<String>) -> Self {
        Self {
            id: generate_record_id(),
            url: url.into(),
            timestamp: Utc::now(),
            reason,
            blocked_by: blocked_by.into(),
        }
    }

    /// Override the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// One entry of the browsing history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub was_blocked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: generate_record_id(),
            url: url.into(),
            title: title.into(),
            timestamp: Utc::now(),
            was_blocked: false,
            reason: None,
            blocked_by: None,
        }
    }
}

fn generate_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
