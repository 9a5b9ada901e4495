//! Navigation guard
//!
//! The entry point a browser shell calls before committing a navigation.
//! It evaluates the URL against the cached snapshot, never touches storage,
//! and hands audit records to an [`AuditReporter`] without waiting on it.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, info};

use safenav_core::{AuditReporter, BlockDecision};

use crate::engine::PolicyEngine;
use crate::snapshot::SnapshotCache;

/// Pages that are never subject to policy
pub fn is_always_allowed(url: &str) -> bool {
    let url = url.trim();
    url.eq_ignore_ascii_case("about:blank")
        || url
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Synchronous per-navigation check over a shared [`SnapshotCache`]
#[derive(Clone)]
pub struct NavigationGuard {
    engine: PolicyEngine,
    cache: Arc<SnapshotCache>,
    reporter: Option<Arc<dyn AuditReporter>>,
}

impl NavigationGuard {
    pub fn new(engine: PolicyEngine, cache: Arc<SnapshotCache>) -> Self {
        Self {
            engine,
            cache,
            reporter: None,
        }
    }

    /// Report blocks and visits to `reporter`
    pub fn with_reporter(mut self, reporter: Arc<dyn AuditReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Decide `url` at the current local time
    pub fn check(&self, url: &str) -> BlockDecision {
        self.check_at(url, Local::now().naive_local())
    }

    /// Decide `url` at local time `now`.
    ///
    /// A block is reported as a blocked attempt plus a history entry.
    pub fn check_at(&self, url: &str, now: NaiveDateTime) -> BlockDecision {
        if is_always_allowed(url) {
            metrics::counter!("safenav_navigations_total", "outcome" => "exempt").increment(1);
            return BlockDecision::allow();
        }

        let snapshot = self.cache.current();
        let decision = self.engine.evaluate_at(url, &snapshot, now);

        match (decision.reason, decision.blocked_by.as_deref()) {
            (Some(reason), Some(blocked_by)) if decision.blocked => {
                info!(url = %url, reason = %reason, blocked_by = %blocked_by, "Navigation blocked");
                metrics::counter!("safenav_navigations_total", "outcome" => "blocked").increment(1);
                metrics::counter!("safenav_blocks_total", "reason" => reason.as_str()).increment(1);

                if let Some(reporter) = &self.reporter {
                    reporter.log_blocked_attempt(url, reason, blocked_by);
                    reporter.log_navigation(url, "", true, Some(reason), Some(blocked_by));
                }
            }
            _ => {
                debug!(url = %url, "Navigation allowed");
                metrics::counter!("safenav_navigations_total", "outcome" => "allowed").increment(1);
            }
        }

        decision
    }

    /// Record a completed visit once the page title is known
    pub fn record_visit(&self, url: &str, title: &str) {
        if is_always_allowed(url) {
            return;
        }
        if let Some(reporter) = &self.reporter {
            reporter.log_navigation(url, title, false, None, None);
        }
    }
}
