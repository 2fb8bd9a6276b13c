//! Environment configuration.

use anyhow::{Context, Result};
use ward_authz::AuthzConfig;
use ward_db::DbConfig;

/// Process configuration sourced from `WARD_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub authz: AuthzConfig,
    /// Shared cache backend. `None` keeps the process-local cache.
    pub redis_url: Option<String>,
    /// Create the system catalog on startup when missing.
    pub seed_system: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_defaults = DbConfig::default();
        let authz_defaults = AuthzConfig::default();

        let db = DbConfig {
            url: lookup("WARD_DB_URL").unwrap_or(db_defaults.url),
            namespace: lookup("WARD_DB_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: lookup("WARD_DB_DATABASE").unwrap_or(db_defaults.database),
            username: lookup("WARD_DB_USER").unwrap_or(db_defaults.username),
            password: lookup("WARD_DB_PASSWORD").unwrap_or(db_defaults.password),
        };

        let cache_ttl_secs = match lookup("WARD_CACHE_TTL_SECS") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| "parse WARD_CACHE_TTL_SECS")?,
            None => authz_defaults.cache_ttl_secs,
        };
        if cache_ttl_secs == 0 {
            anyhow::bail!("WARD_CACHE_TTL_SECS must be greater than zero");
        }
        let decision_timeout_ms = match lookup("WARD_DECISION_TIMEOUT_MS") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| "parse WARD_DECISION_TIMEOUT_MS")?,
            None => authz_defaults.decision_timeout_ms,
        };
        if decision_timeout_ms == 0 {
            anyhow::bail!("WARD_DECISION_TIMEOUT_MS must be greater than zero");
        }
        let authz = AuthzConfig {
            cache_ttl_secs,
            cache_key_prefix: lookup("WARD_CACHE_PREFIX")
                .unwrap_or(authz_defaults.cache_key_prefix),
            decision_timeout_ms,
        };

        let redis_url = lookup("WARD_REDIS_URL").filter(|value| !value.is_empty());
        let seed_system = lookup("WARD_SEED_SYSTEM")
            .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        Ok(Self {
            db,
            authz,
            redis_url,
            seed_system,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db.url, "127.0.0.1:8000");
        assert_eq!(config.db.namespace, "ward");
        assert_eq!(config.authz.cache_ttl_secs, 900);
        assert_eq!(config.authz.cache_key_prefix, "ward:perm:");
        assert_eq!(config.authz.decision_timeout_ms, 2000);
        assert!(config.redis_url.is_none());
        assert!(config.seed_system);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("WARD_DB_URL", "db:8000"),
            ("WARD_DB_DATABASE", "perm"),
            ("WARD_CACHE_TTL_SECS", "60"),
            ("WARD_CACHE_PREFIX", "tenant:perm:"),
            ("WARD_DECISION_TIMEOUT_MS", "250"),
            ("WARD_REDIS_URL", "redis://cache:6379"),
            ("WARD_SEED_SYSTEM", "false"),
        ])
        .unwrap();

        assert_eq!(config.db.url, "db:8000");
        assert_eq!(config.db.database, "perm");
        assert_eq!(config.authz.cache_ttl_secs, 60);
        assert_eq!(config.authz.cache_key_prefix, "tenant:perm:");
        assert_eq!(config.authz.decision_timeout_ms, 250);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert!(!config.seed_system);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(config_from(&[("WARD_CACHE_TTL_SECS", "soon")]).is_err());
        assert!(config_from(&[("WARD_CACHE_TTL_SECS", "0")]).is_err());
        assert!(config_from(&[("WARD_DECISION_TIMEOUT_MS", "-1")]).is_err());
    }

    #[test]
    fn empty_redis_url_means_memory() {
        let config = config_from(&[("WARD_REDIS_URL", "")]).unwrap();
        assert!(config.redis_url.is_none());
    }
}
