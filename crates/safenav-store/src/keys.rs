//! Storage keys

pub const BLOCKED_DOMAINS: &str = "blocked_domains";
pub const BLOCKED_KEYWORDS: &str = "blocked_keywords";
pub const WHITELIST_DOMAINS: &str = "whitelist_domains";
pub const STRICT_MODE: &str = "strict_mode";
pub const SCHEDULE: &str = "schedule";
pub const SETTINGS: &str = "settings";
pub const BLOCKED_ATTEMPTS: &str = "blocked_attempts";
pub const HISTORY: &str = "browsing_history";
