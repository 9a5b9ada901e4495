//! Typed access to blocking rules, settings, and audit logs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use safenav_core::{
    AuditSink, BlockedAttempt, ContentFilterMode, Error, HistoryEntry, PolicySource, Result,
    ScheduleData, ScheduleRule, Settings,
};

use crate::keys;
use crate::kv::KeyValueStore;
use crate::normalize::{normalize_domain, normalize_keyword};

/// Blocked attempts kept before the oldest are evicted
pub const MAX_BLOCKED_ATTEMPTS: usize = 500;

/// History entries kept before the oldest are evicted
pub const MAX_HISTORY_ENTRIES: usize = 1000;

/// Caps on the two audit logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLimits {
    pub blocked_attempts: usize,
    pub history: usize,
}

impl Default for LogLimits {
    fn default() -> Self {
        Self {
            blocked_attempts: MAX_BLOCKED_ATTEMPTS,
            history: MAX_HISTORY_ENTRIES,
        }
    }
}

/// Blocking configuration and audit logs over any [`KeyValueStore`].
///
/// Every value is stored as JSON under a fixed key. Lists are kept newest
/// first. Read-modify-write operations are serialized so concurrent appends
/// do not lose records.
pub struct BlockingStore<S> {
    kv: S,
    limits: LogLimits,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> BlockingStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            limits: LogLimits::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_limits(mut self, limits: LogLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> LogLimits {
        self.limits
    }

    pub fn inner(&self) -> &S {
        &self.kv
    }

    // Unreadable values are reported and treated as absent
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored value is malformed, using default");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, raw).await
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.read_json(key).await?.unwrap_or_default())
    }

    /// Insert at the front unless present; `true` when the list changed
    async fn add_to_list(&self, key: &str, value: String) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut list: Vec<String> = self.read_list(key).await?;
        if list.contains(&value) {
            return Ok(false);
        }
        list.insert(0, value);
        self.write_json(key, &list).await?;
        Ok(true)
    }

    async fn remove_from_list(&self, key: &str, value: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut list: Vec<String> = self.read_list(key).await?;
        let before = list.len();
        list.retain(|item| item != value);
        if list.len() == before {
            return Ok(false);
        }
        self.write_json(key, &list).await?;
        Ok(true)
    }

    async fn push_capped<T>(&self, key: &str, record: T, cap: usize) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.write_lock.lock().await;
        let mut log: Vec<T> = self.read_list(key).await?;
        log.insert(0, record);
        log.truncate(cap);
        self.write_json(key, &log).await
    }

    // Domains

    pub async fn blocked_domains(&self) -> Result<Vec<String>> {
        self.read_list(keys::BLOCKED_DOMAINS).await
    }

    /// Add a blocked domain; `false` if it was already listed
    pub async fn add_blocked_domain(&self, domain: &str) -> Result<bool> {
        let domain = normalize_domain(domain)?;
        let added = self.add_to_list(keys::BLOCKED_DOMAINS, domain.clone()).await?;
        if added {
            info!(domain = %domain, "Blocked domain added");
        }
        Ok(added)
    }

    pub async fn remove_blocked_domain(&self, domain: &str) -> Result<bool> {
        let domain = normalize_domain(domain)?;
        self.remove_from_list(keys::BLOCKED_DOMAINS, &domain).await
    }

    // Keywords

    pub async fn blocked_keywords(&self) -> Result<Vec<String>> {
        self.read_list(keys::BLOCKED_KEYWORDS).await
    }

    pub async fn add_blocked_keyword(&self, keyword: &str) -> Result<bool> {
        let keyword = normalize_keyword(keyword)?;
        let added = self.add_to_list(keys::BLOCKED_KEYWORDS, keyword.clone()).await?;
        if added {
            info!(keyword = %keyword, "Blocked keyword added");
        }
        Ok(added)
    }

    pub async fn remove_blocked_keyword(&self, keyword: &str) -> Result<bool> {
        let keyword = normalize_keyword(keyword)?;
        self.remove_from_list(keys::BLOCKED_KEYWORDS, &keyword).await
    }

    // Whitelist

    pub async fn whitelist_domains(&self) -> Result<Vec<String>> {
        self.read_list(keys::WHITELIST_DOMAINS).await
    }

    pub async fn add_whitelist_domain(&self, domain: &str) -> Result<bool> {
        let domain = normalize_domain(domain)?;
        let added = self.add_to_list(keys::WHITELIST_DOMAINS, domain.clone()).await?;
        if added {
            info!(domain = %domain, "Whitelist domain added");
        }
        Ok(added)
    }

    pub async fn remove_whitelist_domain(&self, domain: &str) -> Result<bool> {
        let domain = normalize_domain(domain)?;
        self.remove_from_list(keys::WHITELIST_DOMAINS, &domain).await
    }

    // Strict mode

    pub async fn strict_mode_enabled(&self) -> Result<bool> {
        Ok(self.read_json(keys::STRICT_MODE).await?.unwrap_or(false))
    }

    pub async fn set_strict_mode(&self, enabled: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_json(keys::STRICT_MODE, &enabled).await?;
        info!(enabled, "Strict mode updated");
        Ok(())
    }

    // Schedule

    /// `None` until a schedule has been saved
    pub async fn schedule(&self) -> Result<Option<ScheduleData>> {
        self.read_json(keys::SCHEDULE).await
    }

    /// Replace the schedule after validating every rule
    pub async fn set_schedule(&self, schedule: &ScheduleData) -> Result<()> {
        for rule in &schedule.rules {
            rule.validate()?;
        }
        let _guard = self.write_lock.lock().await;
        self.write_json(keys::SCHEDULE, schedule).await
    }

    /// Append a validated rule, creating the schedule if needed
    pub async fn add_schedule_rule(&self, rule: ScheduleRule) -> Result<ScheduleData> {
        rule.validate()?;
        self.update_schedule(|schedule| schedule.rules.push(rule)).await
    }

    pub async fn set_schedule_enabled(&self, enabled: bool) -> Result<ScheduleData> {
        self.update_schedule(|schedule| schedule.enabled = enabled).await
    }

    pub async fn set_temporary_override(&self, active: bool) -> Result<ScheduleData> {
        self.update_schedule(|schedule| schedule.temporary_override = active).await
    }

    pub async fn clear_schedule(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(keys::SCHEDULE).await
    }

    async fn update_schedule(&self, apply: impl FnOnce(&mut ScheduleData) + Send) -> Result<ScheduleData> {
        let _guard = self.write_lock.lock().await;
        let mut schedule: ScheduleData = self.read_json(keys::SCHEDULE).await?.unwrap_or_default();
        apply(&mut schedule);
        self.write_json(keys::SCHEDULE, &schedule).await?;
        Ok(schedule)
    }

    // Settings

    /// Stored settings merged over defaults
    pub async fn settings(&self) -> Result<Settings> {
        let stored: Option<Value> = self.read_json(keys::SETTINGS).await?;
        merge_settings(stored, None)
    }

    /// Apply a partial JSON object over the current settings
    pub async fn update_settings(&self, patch: Value) -> Result<Settings> {
        if !patch.is_object() {
            return Err(Error::invalid_input("settings patch must be a JSON object"));
        }
        let _guard = self.write_lock.lock().await;
        let stored: Option<Value> = self.read_json(keys::SETTINGS).await?;
        let settings = merge_settings(stored, Some(patch))?;
        self.write_json(keys::SETTINGS, &settings).await?;
        Ok(settings)
    }

    pub async fn set_content_filter_mode(&self, mode: ContentFilterMode) -> Result<Settings> {
        let patch = serde_json::json!({ "contentFilterMode": mode });
        self.update_settings(patch).await
    }

    // Audit logs

    /// Newest first
    pub async fn blocked_attempts(&self) -> Result<Vec<BlockedAttempt>> {
        self.read_list(keys::BLOCKED_ATTEMPTS).await
    }

    pub async fn log_blocked_attempt(&self, attempt: BlockedAttempt) -> Result<()> {
        debug!(url = %attempt.url, reason = %attempt.reason, "Logging blocked attempt");
        self.push_capped(keys::BLOCKED_ATTEMPTS, attempt, self.limits.blocked_attempts)
            .await
    }

    pub async fn clear_blocked_attempts(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(keys::BLOCKED_ATTEMPTS).await
    }

    /// Newest first
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        self.read_list(keys::HISTORY).await
    }

    /// Append a history entry unless history recording is turned off.
    ///
    /// Returns whether the entry was stored.
    pub async fn add_history_entry(&self, entry: HistoryEntry) -> Result<bool> {
        if !self.settings().await?.record_history {
            debug!(url = %entry.url, "History recording disabled, skipping entry");
            return Ok(false);
        }
        self.push_capped(keys::HISTORY, entry, self.limits.history).await?;
        Ok(true)
    }

    pub async fn clear_history(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(keys::HISTORY).await
    }
}

/// Defaults, then the stored object, then `patch`, key by key
fn merge_settings(stored: Option<Value>, patch: Option<Value>) -> Result<Settings> {
    let mut merged = serde_json::to_value(Settings::default())?;

    for layer in [stored, patch].into_iter().flatten() {
        match (merged.as_object_mut(), layer) {
            (Some(target), Value::Object(fields)) => target.extend(fields),
            (_, other) => warn!(value = %other, "Ignoring non-object settings value"),
        }
    }

    match serde_json::from_value(merged) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            warn!(error = %e, "Stored settings are invalid, using defaults");
            Ok(Settings::default())
        }
    }
}

#[async_trait]
impl<S: KeyValueStore> PolicySource for BlockingStore<S> {
    async fn blocked_domains(&self) -> Result<Vec<String>> {
        BlockingStore::blocked_domains(self).await
    }

    async fn blocked_keywords(&self) -> Result<Vec<String>> {
        BlockingStore::blocked_keywords(self).await
    }

    async fn whitelist_domains(&self) -> Result<Vec<String>> {
        BlockingStore::whitelist_domains(self).await
    }

    async fn strict_mode_enabled(&self) -> Result<bool> {
        BlockingStore::strict_mode_enabled(self).await
    }

    async fn schedule(&self) -> Result<Option<ScheduleData>> {
        BlockingStore::schedule(self).await
    }

    async fn settings(&self) -> Result<Settings> {
        BlockingStore::settings(self).await
    }
}

#[async_trait]
impl<S: KeyValueStore> AuditSink for BlockingStore<S> {
    async fn append_blocked_attempt(&self, attempt: BlockedAttempt) -> Result<()> {
        self.log_blocked_attempt(attempt).await
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        self.add_history_entry(entry).await.map(|_| ())
    }
}
