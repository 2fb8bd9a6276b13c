//! Wiring of repositories, admin use cases and the enforcer.

use surrealdb::{Connection, Surreal};
use ward_admin::{
    DepartmentAdmin, GrantAdmin, ModuleAdmin, PermissionAdmin, RoleAdmin, ScopeAdmin, ServiceAdmin,
};
use ward_authz::{AnyPermissionCache, AuthzConfig, Enforcer};
use ward_db::repository::{
    SurrealDepartmentRepository, SurrealGrantRepository, SurrealModuleRepository,
    SurrealPermissionRepository, SurrealRoleRepository, SurrealScopeRepository,
    SurrealServiceRepository,
};

/// Everything a transport layer needs, sharing one database handle and
/// one cache.
pub struct AppState<C: Connection> {
    pub modules: ModuleAdmin<SurrealModuleRepository<C>>,
    pub departments: DepartmentAdmin<SurrealDepartmentRepository<C>, SurrealModuleRepository<C>>,
    pub services: ServiceAdmin<SurrealServiceRepository<C>, SurrealDepartmentRepository<C>>,
    pub scopes: ScopeAdmin<SurrealScopeRepository<C>>,
    pub roles:
        RoleAdmin<SurrealRoleRepository<C>, SurrealPermissionRepository<C>, AnyPermissionCache>,
    pub permissions: PermissionAdmin<SurrealPermissionRepository<C>, AnyPermissionCache>,
    pub grants: GrantAdmin<
        SurrealGrantRepository<C>,
        SurrealRoleRepository<C>,
        SurrealPermissionRepository<C>,
        AnyPermissionCache,
    >,
    pub enforcer: Enforcer<SurrealGrantRepository<C>, AnyPermissionCache>,
}

impl<C: Connection> AppState<C> {
    pub fn new(db: Surreal<C>, cache: AnyPermissionCache, config: &AuthzConfig) -> Self {
        Self {
            modules: ModuleAdmin::new(SurrealModuleRepository::new(db.clone())),
            departments: DepartmentAdmin::new(
                SurrealDepartmentRepository::new(db.clone()),
                SurrealModuleRepository::new(db.clone()),
            ),
            services: ServiceAdmin::new(
                SurrealServiceRepository::new(db.clone()),
                SurrealDepartmentRepository::new(db.clone()),
            ),
            scopes: ScopeAdmin::new(SurrealScopeRepository::new(db.clone())),
            roles: RoleAdmin::new(
                SurrealRoleRepository::new(db.clone()),
                SurrealPermissionRepository::new(db.clone()),
                cache.clone(),
            ),
            permissions: PermissionAdmin::new(
                SurrealPermissionRepository::new(db.clone()),
                cache.clone(),
            ),
            grants: GrantAdmin::new(
                SurrealGrantRepository::new(db.clone()),
                SurrealRoleRepository::new(db.clone()),
                SurrealPermissionRepository::new(db.clone()),
                cache.clone(),
            ),
            enforcer: Enforcer::new(SurrealGrantRepository::new(db), cache, config),
        }
    }
}
