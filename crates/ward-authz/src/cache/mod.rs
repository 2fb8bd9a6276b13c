//! Per-user cache of resolved permission sets.

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::repository::PermissionSource;

pub use memory::MemoryPermissionCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisPermissionCache;

/// Storage for resolved permission sets, one entry per user.
///
/// A populated empty set is a hit. Only an absent or expired entry is a
/// miss (`Ok(None)`). Errors are real I/O failures and must not be
/// confused with a miss.
pub trait PermissionCache: Send + Sync {
    fn lookup(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = WardResult<Option<HashSet<String>>>> + Send;

    /// Replace the user's entry with `permissions`, expiring after `ttl`.
    fn populate(
        &self,
        user_id: Uuid,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> impl Future<Output = WardResult<()>> + Send;

    /// Drop the user's entry and advance their generation.
    fn invalidate(&self, user_id: Uuid) -> impl Future<Output = WardResult<()>> + Send;

    /// Opaque token that changes on every [`invalidate`](Self::invalidate)
    /// of the user. It never returns to a value it has already handed out.
    fn generation(&self, user_id: Uuid) -> impl Future<Output = WardResult<u64>> + Send;

    /// Like [`populate`](Self::populate), but writes only while the user's
    /// generation still equals `generation`. Returns whether it wrote.
    ///
    /// A set resolved before an invalidation must not outlive it; the
    /// check and the write are a single atomic step.
    fn populate_if_current(
        &self,
        user_id: Uuid,
        generation: u64,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> impl Future<Output = WardResult<bool>> + Send;
}

/// Cache backend selected at startup.
#[derive(Clone)]
pub enum AnyPermissionCache {
    Memory(MemoryPermissionCache),
    #[cfg(feature = "redis")]
    Redis(RedisPermissionCache),
}

impl PermissionCache for AnyPermissionCache {
    async fn lookup(&self, user_id: Uuid) -> WardResult<Option<HashSet<String>>> {
        match self {
            AnyPermissionCache::Memory(cache) => cache.lookup(user_id).await,
            #[cfg(feature = "redis")]
            AnyPermissionCache::Redis(cache) => cache.lookup(user_id).await,
        }
    }

    async fn populate(
        &self,
        user_id: Uuid,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> WardResult<()> {
        match self {
            AnyPermissionCache::Memory(cache) => cache.populate(user_id, permissions, ttl).await,
            #[cfg(feature = "redis")]
            AnyPermissionCache::Redis(cache) => cache.populate(user_id, permissions, ttl).await,
        }
    }

    async fn invalidate(&self, user_id: Uuid) -> WardResult<()> {
        match self {
            AnyPermissionCache::Memory(cache) => cache.invalidate(user_id).await,
            #[cfg(feature = "redis")]
            AnyPermissionCache::Redis(cache) => cache.invalidate(user_id).await,
        }
    }

    async fn generation(&self, user_id: Uuid) -> WardResult<u64> {
        match self {
            AnyPermissionCache::Memory(cache) => cache.generation(user_id).await,
            #[cfg(feature = "redis")]
            AnyPermissionCache::Redis(cache) => cache.generation(user_id).await,
        }
    }

    async fn populate_if_current(
        &self,
        user_id: Uuid,
        generation: u64,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> WardResult<bool> {
        match self {
            AnyPermissionCache::Memory(cache) => {
                cache
                    .populate_if_current(user_id, generation, permissions, ttl)
                    .await
            }
            #[cfg(feature = "redis")]
            AnyPermissionCache::Redis(cache) => {
                cache
                    .populate_if_current(user_id, generation, permissions, ttl)
                    .await
            }
        }
    }
}

/// Read-through combination of a cache and a permission source.
///
/// On a miss the source is queried and the cache populated before the
/// set is returned. The write is skipped if the user was invalidated
/// while the source was queried, so a set read before a grant change
/// never outlives the invalidation. Concurrent misses with no
/// invalidation in between both populate; the last write wins. Cache
/// failures propagate so callers fail closed.
pub struct CachedPermissions<S, C> {
    source: S,
    cache: C,
    ttl: Duration,
}

impl<S: PermissionSource, C: PermissionCache> CachedPermissions<S, C> {
    pub fn new(source: S, cache: C, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn permissions(&self, user_id: Uuid) -> WardResult<HashSet<String>> {
        if let Some(cached) = self.cache.lookup(user_id).await? {
            debug!(%user_id, count = cached.len(), "Permission cache hit");
            return Ok(cached);
        }

        // Read before resolving: an invalidation that lands while the
        // source is queried makes the write below a no-op.
        let generation = self.cache.generation(user_id).await?;
        let resolved = self.source.effective_permissions(user_id).await?;
        let stored = self
            .cache
            .populate_if_current(user_id, generation, &resolved, self.ttl)
            .await?;
        if stored {
            debug!(%user_id, count = resolved.len(), "Permission cache populated");
        } else {
            debug!(%user_id, "Permissions changed during resolve; result not cached");
        }
        Ok(resolved)
    }
}
