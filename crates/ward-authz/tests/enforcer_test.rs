//! Enforcer and read-through cache behaviour against an in-test source.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use ward_authz::{AuthzConfig, Decision, Enforcer, MemoryPermissionCache, PermissionCache};
use ward_core::error::{ErrorKind, WardError, WardResult};
use ward_core::repository::PermissionSource;

/// Permission source backed by a fixed map, counting every resolution.
#[derive(Clone, Default)]
struct CountingSource {
    grants: Arc<HashMap<Uuid, HashSet<String>>>,
    calls: Arc<AtomicUsize>,
    fail: bool,
    delay: Option<Duration>,
}

impl CountingSource {
    fn with(user: Uuid, permissions: &[&str]) -> Self {
        let mut grants = HashMap::new();
        grants.insert(user, permissions.iter().map(|p| p.to_string()).collect());
        Self {
            grants: Arc::new(grants),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PermissionSource for CountingSource {
    async fn effective_permissions(&self, user_id: Uuid) -> WardResult<HashSet<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(WardError::Database("connection refused".into()));
        }
        Ok(self.grants.get(&user_id).cloned().unwrap_or_default())
    }
}

/// Cache whose every operation fails.
struct BrokenCache;

impl PermissionCache for BrokenCache {
    async fn lookup(&self, _user_id: Uuid) -> WardResult<Option<HashSet<String>>> {
        Err(WardError::Cache("unreachable".into()))
    }

    async fn populate(
        &self,
        _user_id: Uuid,
        _permissions: &HashSet<String>,
        _ttl: Duration,
    ) -> WardResult<()> {
        Err(WardError::Cache("unreachable".into()))
    }

    async fn invalidate(&self, _user_id: Uuid) -> WardResult<()> {
        Err(WardError::Cache("unreachable".into()))
    }

    async fn generation(&self, _user_id: Uuid) -> WardResult<u64> {
        Err(WardError::Cache("unreachable".into()))
    }

    async fn populate_if_current(
        &self,
        _user_id: Uuid,
        _generation: u64,
        _permissions: &HashSet<String>,
        _ttl: Duration,
    ) -> WardResult<bool> {
        Err(WardError::Cache("unreachable".into()))
    }
}

/// Source whose grants can change between calls. It snapshots the grants
/// first and then waits, like a query that read before a concurrent write.
#[derive(Clone)]
struct MutableSource {
    grants: Arc<Mutex<HashSet<String>>>,
    delay: Duration,
}

impl MutableSource {
    fn new(permissions: &[&str], delay: Duration) -> Self {
        Self {
            grants: Arc::new(Mutex::new(
                permissions.iter().map(|p| p.to_string()).collect(),
            )),
            delay,
        }
    }

    fn revoke_all(&self) {
        self.grants.lock().unwrap().clear();
    }
}

impl PermissionSource for MutableSource {
    async fn effective_permissions(&self, _user_id: Uuid) -> WardResult<HashSet<String>> {
        let snapshot = self.grants.lock().unwrap().clone();
        tokio::time::sleep(self.delay).await;
        Ok(snapshot)
    }
}

/// Source that fails its first resolution and serves `permissions` after.
#[derive(Clone)]
struct FlakySource {
    permissions: HashSet<String>,
    calls: Arc<AtomicUsize>,
}

impl FlakySource {
    fn new(permissions: &[&str]) -> Self {
        Self {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl PermissionSource for FlakySource {
    async fn effective_permissions(&self, _user_id: Uuid) -> WardResult<HashSet<String>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(WardError::Database("connection reset".into()));
        }
        Ok(self.permissions.clone())
    }
}

fn enforcer(source: CountingSource) -> Enforcer<CountingSource, MemoryPermissionCache> {
    let config = AuthzConfig::default();
    let cache = MemoryPermissionCache::new(config.cache_key_prefix.clone());
    Enforcer::new(source, cache, &config)
}

fn kind(result: WardResult<()>) -> ErrorKind {
    result.unwrap_err().kind()
}

#[tokio::test]
async fn require_all_denies_partial_holder() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::with(user, &["a"]));

    assert_eq!(kind(enforcer.require_all(user, &["a", "b"]).await), ErrorKind::Forbidden);
}

#[tokio::test]
async fn require_any_allows_partial_holder() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::with(user, &["a"]));

    enforcer.require_any(user, &["a", "b"]).await.unwrap();
    enforcer.require_any(user, &["b", "a"]).await.unwrap();
}

#[tokio::test]
async fn require_one_denies_absent_permission_in_non_empty_set() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::with(user, &["a", "b"]));

    enforcer.require_one(user, "a").await.unwrap();
    assert_eq!(kind(enforcer.require_one(user, "c").await), ErrorKind::Forbidden);
}

#[tokio::test]
async fn empty_lists() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::with(user, &["a"]));

    enforcer.require_all(user, &[]).await.unwrap();
    assert_eq!(kind(enforcer.require_any(user, &[]).await), ErrorKind::Forbidden);
}

#[tokio::test]
async fn cache_hit_skips_resolver() {
    let user = Uuid::new_v4();
    let source = CountingSource::with(user, &["a"]);
    let enforcer = enforcer(source.clone());

    enforcer.require_one(user, "a").await.unwrap();
    enforcer.require_one(user, "a").await.unwrap();
    enforcer.require_all(user, &["a"]).await.unwrap();

    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn empty_set_is_cached_too() {
    let user = Uuid::new_v4();
    let source = CountingSource::default();
    let enforcer = enforcer(source.clone());

    assert!(enforcer.require_one(user, "a").await.is_err());
    assert!(enforcer.require_one(user, "a").await.is_err());

    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn invalidation_forces_resolve() {
    let user = Uuid::new_v4();
    let source = CountingSource::with(user, &["a"]);
    let enforcer = enforcer(source.clone());

    enforcer.require_one(user, "a").await.unwrap();
    enforcer.cache().invalidate(user).await.unwrap();
    enforcer.require_one(user, "a").await.unwrap();

    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn expired_entry_resolves_again() {
    let user = Uuid::new_v4();
    let source = CountingSource::with(user, &["a"]);
    let config = AuthzConfig {
        cache_ttl_secs: 10,
        ..Default::default()
    };
    let enforcer = Enforcer::new(
        source.clone(),
        MemoryPermissionCache::new("ward:perm:"),
        &config,
    );

    enforcer.require_one(user, "a").await.unwrap();
    tokio::time::advance(Duration::from_secs(5)).await;
    enforcer.require_one(user, "a").await.unwrap();
    assert_eq!(source.calls(), 1);

    tokio::time::advance(Duration::from_secs(6)).await;
    enforcer.require_one(user, "a").await.unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn resolver_failure_fails_closed() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::failing());

    assert_eq!(kind(enforcer.require_one(user, "a").await), ErrorKind::Internal);
    assert_eq!(kind(enforcer.require_all(user, &["a", "b"]).await), ErrorKind::Internal);
    assert_eq!(kind(enforcer.require_any(user, &["a", "b"]).await), ErrorKind::Internal);
}

#[tokio::test]
async fn require_any_skips_failed_check_and_allows_later_hit() {
    let user = Uuid::new_v4();
    let config = AuthzConfig::default();
    let enforcer = Enforcer::new(
        FlakySource::new(&["b"]),
        MemoryPermissionCache::new(config.cache_key_prefix.clone()),
        &config,
    );

    enforcer.require_any(user, &["a", "b"]).await.unwrap();
}

#[tokio::test]
async fn require_any_with_some_failures_and_no_hit_is_forbidden() {
    let user = Uuid::new_v4();
    let config = AuthzConfig::default();
    let enforcer = Enforcer::new(
        FlakySource::new(&[]),
        MemoryPermissionCache::new(config.cache_key_prefix.clone()),
        &config,
    );

    assert_eq!(kind(enforcer.require_any(user, &["a", "b"]).await), ErrorKind::Forbidden);
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_resolve_is_not_undone() {
    let user = Uuid::new_v4();
    let source = MutableSource::new(&["secret"], Duration::from_millis(200));
    let config = AuthzConfig::default();
    let enforcer = Enforcer::new(
        source.clone(),
        MemoryPermissionCache::new(config.cache_key_prefix.clone()),
        &config,
    );

    let in_flight = tokio::spawn({
        let enforcer = enforcer.clone();
        async move { enforcer.require_one(user, "secret").await }
    });
    // Let the request read its snapshot before the revoke lands.
    tokio::time::sleep(Duration::from_millis(50)).await;

    source.revoke_all();
    enforcer.cache().invalidate(user).await.unwrap();

    // Started before the revoke, so it may still see the old set.
    in_flight.await.unwrap().unwrap();

    assert_eq!(enforcer.cache().lookup(user).await.unwrap(), None);
    assert_eq!(kind(enforcer.require_one(user, "secret").await), ErrorKind::Forbidden);
}

#[tokio::test]
async fn require_all_stops_at_first_failure() {
    let user = Uuid::new_v4();
    let source = CountingSource::failing();
    let enforcer = enforcer(source.clone());

    assert!(enforcer.require_all(user, &["a", "b", "c"]).await.is_err());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn cache_failure_fails_closed() {
    let user = Uuid::new_v4();
    let source = CountingSource::with(user, &["a"]);
    let enforcer = Enforcer::new(source.clone(), BrokenCache, &AuthzConfig::default());

    let err = enforcer.require_one(user, "a").await.unwrap_err();
    assert!(matches!(err, WardError::Cache(_)), "got {err:?}");
    assert_eq!(source.calls(), 0, "a broken cache is not treated as a miss");
}

#[tokio::test]
async fn cancelled_request_is_denied() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::with(user, &["a"]));

    let token = CancellationToken::new();
    token.cancel();
    let scoped = enforcer.with_cancellation(token);

    let err = scoped.require_one(user, "a").await.unwrap_err();
    assert!(matches!(err, WardError::Cancelled));
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(matches!(
        scoped.require_any(user, &["a", "b"]).await,
        Err(WardError::Cancelled)
    ));

    // The original handle is unaffected.
    enforcer.require_one(user, "a").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_resolution_times_out() {
    let user = Uuid::new_v4();
    let config = AuthzConfig {
        decision_timeout_ms: 100,
        ..Default::default()
    };
    let enforcer = Enforcer::new(
        CountingSource::slow(Duration::from_secs(5)),
        MemoryPermissionCache::new("ward:perm:"),
        &config,
    );

    assert_eq!(kind(enforcer.require_one(user, "a").await), ErrorKind::Internal);
}

#[tokio::test]
async fn check_helpers_report_decisions() {
    let user = Uuid::new_v4();
    let enforcer = enforcer(CountingSource::with(user, &["a"]));

    assert_eq!(enforcer.check_one(user, "a").await, Decision::Allowed);
    assert_eq!(enforcer.check_all(user, &["a", "b"]).await, Decision::Denied);
    assert_eq!(enforcer.check_any(user, &["b", "a"]).await, Decision::Allowed);

    let failing = self::enforcer(CountingSource::failing());
    assert_eq!(failing.check_one(user, "a").await, Decision::Failed);
}
