//! Decision counters

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use safenav_core::{BlockDecision, BlockReason};

/// In-process counters for navigation decisions
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    evaluations: AtomicU64,
    allowed: AtomicU64,
    /// Indexed like [`BlockReason::ALL`]
    blocked: [AtomicU64; BlockReason::ALL.len()],
    total_latency_us: AtomicU64,
}

fn reason_index(reason: BlockReason) -> usize {
    BlockReason::ALL
        .iter()
        .position(|r| *r == reason)
        .unwrap_or_default()
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                evaluations: AtomicU64::new(0),
                allowed: AtomicU64::new(0),
                blocked: Default::default(),
                total_latency_us: AtomicU64::new(0),
            }),
        }
    }

    /// Record the outcome of one evaluation
    pub fn record_decision(&self, decision: &BlockDecision) {
        self.inner.evaluations.fetch_add(1, Ordering::Relaxed);
        match decision.reason {
            Some(reason) if decision.blocked => {
                self.inner.blocked[reason_index(reason)].fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.inner.allowed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record evaluation latency
    pub fn record_latency(&self, latency_us: u64) {
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let blocked = BlockReason::ALL
            .iter()
            .zip(self.inner.blocked.iter())
            .map(|(reason, count)| (*reason, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        MetricsSnapshot {
            evaluations: self.inner.evaluations.load(Ordering::Relaxed),
            allowed: self.inner.allowed.load(Ordering::Relaxed),
            blocked,
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub evaluations: u64,
    pub allowed: u64,
    /// Only reasons seen at least once
    pub blocked: BTreeMap<BlockReason, u64>,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    pub fn total_blocked(&self) -> u64 {
        self.blocked.values().sum()
    }

    pub fn blocked_for(&self, reason: BlockReason) -> u64 {
        self.blocked.get(&reason).copied().unwrap_or(0)
    }

    /// Share of evaluations that were blocked
    pub fn block_rate(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            self.total_blocked() as f64 / self.evaluations as f64
        }
    }

    /// Calculate average latency per evaluation
    pub fn avg_latency_us(&self) -> u64 {
        if self.evaluations == 0 {
            0
        } else {
            self.total_latency_us / self.evaluations
        }
    }
}
