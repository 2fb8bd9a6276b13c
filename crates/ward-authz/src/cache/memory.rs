//! In-process permission cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use uuid::Uuid;
use ward_core::error::WardResult;

use super::PermissionCache;

struct CacheEntry {
    permissions: HashSet<String>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(permissions: &HashSet<String>, ttl: Duration) -> Self {
        Self {
            permissions: permissions.clone(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Per-user state. An invalidated user keeps a slot with no entry so the
/// bumped generation survives until the next purge.
struct Slot {
    generation: u64,
    entry: Option<CacheEntry>,
}

/// Sharded concurrent map from `<prefix><user_id>` to a permission set.
///
/// Cloning yields another handle to the same map. Expired entries are
/// treated as misses; [`purge_expired`] sweeps them together with the
/// markers left by invalidation.
///
/// [`purge_expired`]: MemoryPermissionCache::purge_expired
#[derive(Clone)]
pub struct MemoryPermissionCache {
    slots: Arc<DashMap<String, Slot>>,
    /// Generation of users without a slot. Raised to the generation of
    /// every purged slot, so a purged generation is never handed out again.
    floor: Arc<AtomicU64>,
    prefix: String,
}

impl MemoryPermissionCache {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            floor: Arc::new(AtomicU64::new(0)),
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, user_id: Uuid) -> String {
        format!("{}{}", self.prefix, user_id)
    }

    /// Number of stored permission sets, expired ones included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry and invalidation marker, returning how
    /// many slots were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            let live = slot.entry.as_ref().is_some_and(|entry| entry.is_live(now));
            if !live {
                self.floor.fetch_max(slot.generation, Ordering::SeqCst);
            }
            live
        });
        before.saturating_sub(self.slots.len())
    }
}

impl PermissionCache for MemoryPermissionCache {
    async fn lookup(&self, user_id: Uuid) -> WardResult<Option<HashSet<String>>> {
        let now = Instant::now();
        let hit = self.slots.get(&self.key(user_id)).and_then(|slot| {
            slot.entry
                .as_ref()
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.permissions.clone())
        });
        Ok(hit)
    }

    async fn populate(
        &self,
        user_id: Uuid,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> WardResult<()> {
        match self.slots.entry(self.key(user_id)) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().entry = Some(CacheEntry::new(permissions, ttl));
            }
            Entry::Vacant(slot) => {
                slot.insert(Slot {
                    generation: self.floor.load(Ordering::SeqCst),
                    entry: Some(CacheEntry::new(permissions, ttl)),
                });
            }
        }
        Ok(())
    }

    async fn invalidate(&self, user_id: Uuid) -> WardResult<()> {
        let floor = self.floor.load(Ordering::SeqCst);
        self.slots
            .entry(self.key(user_id))
            .and_modify(|slot| {
                slot.generation = slot.generation.max(floor) + 1;
                slot.entry = None;
            })
            .or_insert(Slot {
                generation: floor + 1,
                entry: None,
            });
        Ok(())
    }

    async fn generation(&self, user_id: Uuid) -> WardResult<u64> {
        let generation = match self.slots.get(&self.key(user_id)) {
            Some(slot) => slot.generation,
            None => self.floor.load(Ordering::SeqCst),
        };
        Ok(generation)
    }

    async fn populate_if_current(
        &self,
        user_id: Uuid,
        generation: u64,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> WardResult<bool> {
        // The entry guard holds the shard lock across the check and the write.
        match self.slots.entry(self.key(user_id)) {
            Entry::Occupied(mut slot) => {
                if slot.get().generation != generation {
                    return Ok(false);
                }
                slot.get_mut().entry = Some(CacheEntry::new(permissions, ttl));
            }
            Entry::Vacant(slot) => {
                if self.floor.load(Ordering::SeqCst) != generation {
                    return Ok(false);
                }
                slot.insert(Slot {
                    generation,
                    entry: Some(CacheEntry::new(permissions, ttl)),
                });
            }
        }
        Ok(true)
    }
}
