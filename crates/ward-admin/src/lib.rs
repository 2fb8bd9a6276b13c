//! Ward Admin — use cases that mutate the hierarchy and the role/permission
//! graph.
//!
//! Repositories store whatever they are handed. The services here enforce
//! the rules around them: required fields, parent existence, the
//! same-module rule for departments, code uniqueness, protection of
//! system rows and the role deletion guard. Every grant mutation also
//! invalidates the cached permission sets of the users it affects.
//!
//! Each service is generic over its repositories (and the cache where
//! grants are involved) so this crate never depends on a storage engine.

mod department;
mod grant;
mod invalidation;
mod module;
mod permission;
mod role;
mod scope;
mod service;
mod validation;

pub use department::DepartmentAdmin;
pub use grant::GrantAdmin;
pub use module::ModuleAdmin;
pub use permission::PermissionAdmin;
pub use role::RoleAdmin;
pub use scope::ScopeAdmin;
pub use service::ServiceAdmin;
