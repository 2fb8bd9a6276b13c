//! Ward Authz — turns a user id and a requested permission string into an
//! allow/deny decision.
//!
//! The pipeline is `Enforcer` → `CachedPermissions` → `PermissionCache`
//! (hit) or `PermissionResolver` (miss). Every piece is injected; nothing
//! here owns a global handle.

pub mod cache;
pub mod config;
pub mod enforcer;
pub mod resolver;

pub use cache::{AnyPermissionCache, CachedPermissions, MemoryPermissionCache, PermissionCache};
#[cfg(feature = "redis")]
pub use cache::RedisPermissionCache;
pub use config::AuthzConfig;
pub use enforcer::{Decision, Enforcer};
pub use resolver::PermissionResolver;
