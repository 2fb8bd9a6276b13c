//! Redis-backed permission cache, shared across processes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use tracing::instrument;
use uuid::Uuid;
use ward_core::error::{WardError, WardResult};

use super::PermissionCache;

/// Hash field written alongside the permissions so an empty set still
/// leaves a key behind.
const POPULATED_FIELD: &str = "__populated__";

/// Generation counters outlive any in-flight resolve by a wide margin.
const GENERATION_TTL_SECS: i64 = 24 * 60 * 60;

/// KEYS[1] permission hash, KEYS[2] generation counter.
/// ARGV[1] expected generation, ARGV[2] TTL in seconds, ARGV[3..] fields.
const POPULATE_IF_CURRENT: &str = r"
local current = redis.call('GET', KEYS[2]) or '0'
if current ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
for i = 3, #ARGV do
    redis.call('HSET', KEYS[1], ARGV[i], '1')
end
redis.call('EXPIRE', KEYS[1], ARGV[2])
return 1
";

fn cache_err(err: redis::RedisError) -> WardError {
    WardError::Cache(err.to_string())
}

/// EXPIRE 0 would delete the key at once, so sub-second TTLs round up.
fn ttl_secs(ttl: Duration) -> i64 {
    ttl.as_secs().max(1) as i64
}

/// One Redis hash per user at `<prefix><user_id>`, fields are permission
/// strings. A counter at `<prefix><user_id>:gen` is bumped on every
/// invalidation.
#[derive(Clone)]
pub struct RedisPermissionCache {
    conn: MultiplexedConnection,
    prefix: String,
    populate_script: Arc<Script>,
}

impl RedisPermissionCache {
    pub async fn connect(url: &str, prefix: impl Into<String>) -> WardResult<Self> {
        let client = redis::Client::open(url).map_err(cache_err)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(cache_err)?;
        Ok(Self {
            conn,
            prefix: prefix.into(),
            populate_script: Arc::new(Script::new(POPULATE_IF_CURRENT)),
        })
    }

    fn key(&self, user_id: Uuid) -> String {
        format!("{}{}", self.prefix, user_id)
    }

    fn generation_key(&self, user_id: Uuid) -> String {
        format!("{}{}:gen", self.prefix, user_id)
    }
}

impl PermissionCache for RedisPermissionCache {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn lookup(&self, user_id: Uuid) -> WardResult<Option<HashSet<String>>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> =
            conn.hgetall(self.key(user_id)).await.map_err(cache_err)?;

        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            fields
                .into_keys()
                .filter(|field| field != POPULATED_FIELD)
                .collect(),
        ))
    }

    #[instrument(
        skip(self, permissions),
        fields(user_id = %user_id, count = permissions.len()),
        err
    )]
    async fn populate(
        &self,
        user_id: Uuid,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> WardResult<()> {
        let key = self.key(user_id);
        let mut fields: Vec<(&str, &str)> = Vec::with_capacity(permissions.len() + 1);
        fields.push((POPULATED_FIELD, "1"));
        fields.extend(permissions.iter().map(|p| (p.as_str(), "1")));

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, &fields)
            .ignore()
            .expire(&key, ttl_secs(ttl))
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_err)
    }

    async fn invalidate(&self, user_id: Uuid) -> WardResult<()> {
        let generation_key = self.generation_key(user_id);

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .del(self.key(user_id))
            .ignore()
            .incr(&generation_key, 1)
            .ignore()
            .expire(&generation_key, GENERATION_TTL_SECS)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_err)
    }

    async fn generation(&self, user_id: Uuid) -> WardResult<u64> {
        let mut conn = self.conn.clone();
        let generation: Option<u64> = conn
            .get(self.generation_key(user_id))
            .await
            .map_err(cache_err)?;
        Ok(generation.unwrap_or(0))
    }

    #[instrument(
        skip(self, permissions),
        fields(user_id = %user_id, count = permissions.len()),
        err
    )]
    async fn populate_if_current(
        &self,
        user_id: Uuid,
        generation: u64,
        permissions: &HashSet<String>,
        ttl: Duration,
    ) -> WardResult<bool> {
        let mut invocation = self.populate_script.prepare_invoke();
        invocation
            .key(self.key(user_id))
            .key(self.generation_key(user_id))
            .arg(generation.to_string())
            .arg(ttl_secs(ttl))
            .arg(POPULATED_FIELD);
        for permission in permissions {
            invocation.arg(permission.as_str());
        }

        let mut conn = self.conn.clone();
        let written: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(cache_err)?;
        Ok(written == 1)
    }
}
