//! Authorization configuration.

use std::time::Duration;

/// Configuration for resolution, caching and enforcement.
#[derive(Debug, Clone)]
pub struct AuthzConfig {
    /// Lifetime of a cached permission set in seconds (default: 900 = 15 minutes).
    pub cache_ttl_secs: u64,
    /// Prefix of per-user cache keys (default: `ward:perm:`).
    pub cache_key_prefix: String,
    /// Upper bound on a single permission check in milliseconds (default: 2000).
    pub decision_timeout_ms: u64,
}

impl AuthzConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 900,
            cache_key_prefix: "ward:perm:".into(),
            decision_timeout_ms: 2000,
        }
    }
}
