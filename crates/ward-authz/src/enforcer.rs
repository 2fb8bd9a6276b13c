//! Authorization enforcer: require one, any or all of a set of permissions.
//!
//! Every check fails closed. A cache or database failure, a timeout or a
//! cancelled request never results in an allow.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use uuid::Uuid;
use ward_core::error::{ErrorKind, WardError, WardResult};
use ward_core::repository::PermissionSource;

use crate::cache::{CachedPermissions, PermissionCache};
use crate::config::AuthzConfig;
use crate::resolver::PermissionResolver;

/// Outcome of a check for call sites that branch instead of propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// The user lacks the permission.
    Denied,
    /// The check could not be completed; treat as a deny.
    Failed,
}

impl Decision {
    pub fn of(result: &WardResult<()>) -> Self {
        match result {
            Ok(()) => Decision::Allowed,
            Err(e) if e.kind() == ErrorKind::Forbidden => Decision::Denied,
            Err(_) => Decision::Failed,
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }
}

/// Decides whether a user holds permissions, reading through the cache.
///
/// Cheap to clone. [`with_cancellation`](Enforcer::with_cancellation)
/// binds a clone to a request's cancellation token.
pub struct Enforcer<S, C> {
    permissions: Arc<CachedPermissions<PermissionResolver<S>, C>>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<S, C> Clone for Enforcer<S, C> {
    fn clone(&self) -> Self {
        Self {
            permissions: Arc::clone(&self.permissions),
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

impl<S: PermissionSource, C: PermissionCache> Enforcer<S, C> {
    pub fn new(source: S, cache: C, config: &AuthzConfig) -> Self {
        Self {
            permissions: Arc::new(CachedPermissions::new(
                PermissionResolver::new(source),
                cache,
                config.cache_ttl(),
            )),
            timeout: config.decision_timeout(),
            cancel: CancellationToken::new(),
        }
    }

    /// A handle whose checks abort with [`WardError::Cancelled`] once
    /// `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            permissions: Arc::clone(&self.permissions),
            timeout: self.timeout,
            cancel: token,
        }
    }

    pub fn cache(&self) -> &C {
        self.permissions.cache()
    }

    /// Whether the user's effective set contains `permission`.
    async fn holds(&self, user_id: Uuid, permission: &str) -> WardResult<bool> {
        let lookup = tokio::time::timeout(self.timeout, self.permissions.permissions(user_id));

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(WardError::Cancelled),
            outcome = lookup => match outcome {
                Ok(result) => result.map(|set| set.contains(permission)),
                Err(_) => Err(WardError::Internal(format!(
                    "permission check timed out after {}ms",
                    self.timeout.as_millis()
                ))),
            },
        }
    }

    /// Allow iff the user holds `permission`.
    pub async fn require_one(&self, user_id: Uuid, permission: &str) -> WardResult<()> {
        match self.holds(user_id, permission).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(%user_id, permission, "Permission denied");
                Err(WardError::forbidden(format!("missing permission {permission}")))
            }
            Err(e) => {
                error!(%user_id, permission, error = %e, "Permission check failed");
                Err(e)
            }
        }
    }

    /// Allow iff the user holds at least one of `permissions`.
    ///
    /// A failed check counts as not granted and the next one is tried.
    /// Cancellation stops immediately. If every check failed the result is
    /// an internal error rather than a plain deny.
    pub async fn require_any(&self, user_id: Uuid, permissions: &[&str]) -> WardResult<()> {
        if permissions.is_empty() {
            debug!(%user_id, "Permission denied: empty any-of list");
            return Err(WardError::forbidden("no permissions requested"));
        }

        let mut failures = 0;
        for permission in permissions {
            match self.holds(user_id, permission).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(WardError::Cancelled) => return Err(WardError::Cancelled),
                Err(e) => {
                    error!(%user_id, permission, error = %e, "Permission check failed");
                    failures += 1;
                }
            }
        }

        if failures == permissions.len() {
            return Err(WardError::Internal(format!(
                "all {failures} permission checks failed"
            )));
        }
        debug!(%user_id, ?permissions, "Permission denied: none of any-of held");
        Err(WardError::forbidden(format!(
            "missing all of {}",
            permissions.join(", ")
        )))
    }

    /// Allow iff the user holds every one of `permissions`. Stops at the
    /// first missing permission or failure. An empty list allows.
    pub async fn require_all(&self, user_id: Uuid, permissions: &[&str]) -> WardResult<()> {
        for permission in permissions {
            self.require_one(user_id, permission).await?;
        }
        Ok(())
    }

    pub async fn check_one(&self, user_id: Uuid, permission: &str) -> Decision {
        Decision::of(&self.require_one(user_id, permission).await)
    }

    pub async fn check_any(&self, user_id: Uuid, permissions: &[&str]) -> Decision {
        Decision::of(&self.require_any(user_id, permissions).await)
    }

    pub async fn check_all(&self, user_id: Uuid, permissions: &[&str]) -> Decision {
        Decision::of(&self.require_all(user_id, permissions).await)
    }
}
