//! Immutable policy snapshots and the cache that swaps them

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use safenav_core::PolicyInputs;

use crate::keyword::KeywordMatcher;

/// Policy inputs plus everything derived from them once per refresh
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    inputs: PolicyInputs,
    keywords: KeywordMatcher,
    refreshed_at: DateTime<Utc>,
}

impl PolicySnapshot {
    /// Build a snapshot, compiling the keyword list
    pub fn new(inputs: PolicyInputs) -> Self {
        let keywords = KeywordMatcher::new(&inputs.blocked_keywords);
        Self {
            inputs,
            keywords,
            refreshed_at: Utc::now(),
        }
    }

    /// Snapshot of default inputs: nothing blocked
    pub fn empty() -> Self {
        Self::new(PolicyInputs::default())
    }

    pub fn inputs(&self) -> &PolicyInputs {
        &self.inputs
    }

    pub fn keywords(&self) -> &KeywordMatcher {
        &self.keywords
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Holder of the current snapshot.
///
/// Snapshots are replaced whole, never mutated, so a reader holding an
/// `Arc` from [`SnapshotCache::current`] sees one consistent policy.
#[derive(Debug)]
pub struct SnapshotCache {
    current: RwLock<Arc<PolicySnapshot>>,
}

impl SnapshotCache {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now
    pub fn current(&self) -> Arc<PolicySnapshot> {
        self.current.read().clone()
    }

    /// Swap in a new snapshot, returning the previous one
    pub fn replace(&self, snapshot: Arc<PolicySnapshot>) -> Arc<PolicySnapshot> {
        std::mem::replace(&mut *self.current.write(), snapshot)
    }

    /// Build a snapshot from `inputs` and swap it in
    pub fn replace_inputs(&self, inputs: PolicyInputs) -> Arc<PolicySnapshot> {
        let snapshot = Arc::new(PolicySnapshot::new(inputs));
        self.replace(snapshot.clone());
        snapshot
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(PolicySnapshot::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_compiles_keywords() {
        let inputs = PolicyInputs {
            blocked_keywords: vec!["casino".to_string(), " ".to_string()],
            ..Default::default()
        };
        let snapshot = PolicySnapshot::new(inputs);
        assert_eq!(snapshot.keywords().len(), 1);
        assert_eq!(snapshot.inputs().blocked_keywords.len(), 2);
    }

    #[test]
    fn test_replace_keeps_old_readers_consistent() {
        let cache = SnapshotCache::default();
        let before = cache.current();

        let inputs = PolicyInputs {
            blocked_domains: vec!["example.com".to_string()],
            ..Default::default()
        };
        cache.replace_inputs(inputs);

        // The old Arc is untouched by the swap
        assert!(before.inputs().blocked_domains.is_empty());
        assert_eq!(cache.current().inputs().blocked_domains, vec!["example.com"]);
    }

    #[test]
    fn test_replacement_is_stamped() {
        let cache = SnapshotCache::default();
        let before = cache.current().refreshed_at();
        let snapshot = cache.replace_inputs(PolicyInputs::default());
        assert!(snapshot.refreshed_at() >= before);
    }

    #[test]
    fn test_replace_returns_previous() {
        let cache = SnapshotCache::default();
        let first = cache.current();
        let previous = cache.replace(Arc::new(PolicySnapshot::empty()));
        assert!(Arc::ptr_eq(&first, &previous));
    }
}
