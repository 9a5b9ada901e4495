//! SafeNav Store
//!
//! Persistence for blocking rules, settings, and audit logs.
//!
//! Provides:
//! - A string key-value trait with in-memory and JSON-file backends
//! - [`BlockingStore`], the typed view the policy refresher and audit
//!   writer read from and append to

pub mod blocking;
pub mod keys;
pub mod kv;
pub mod normalize;

pub use blocking::{BlockingStore, LogLimits, MAX_BLOCKED_ATTEMPTS, MAX_HISTORY_ENTRIES};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use normalize::{normalize_domain, normalize_keyword};
