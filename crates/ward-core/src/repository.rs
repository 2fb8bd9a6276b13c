//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations perform no
//! business validation (system protection, parent checks, uniqueness
//! pre-checks); that belongs to the admin use cases.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::WardResult;
use crate::models::{
    department::{CreateDepartment, Department, UpdateDepartment},
    grant::UserRoleGrant,
    module::{CreateModule, Module, UpdateModule},
    permission::{CreatePermission, Permission, UpdatePermission},
    role::{CreateRole, Role, UpdateRole},
    scope::{CreateScope, Scope, UpdateScope},
    service::{CreateService, Service, UpdateService},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

pub trait ModuleRepository: Send + Sync {
    fn create(&self, input: CreateModule) -> impl Future<Output = WardResult<Module>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardResult<Module>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = WardResult<Module>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateModule,
    ) -> impl Future<Output = WardResult<Module>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WardResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WardResult<PaginatedResult<Module>>> + Send;
    fn list_active(&self) -> impl Future<Output = WardResult<Vec<Module>>> + Send;
}

pub trait DepartmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDepartment,
    ) -> impl Future<Output = WardResult<Department>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardResult<Department>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = WardResult<Department>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDepartment,
    ) -> impl Future<Output = WardResult<Department>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WardResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WardResult<PaginatedResult<Department>>> + Send;
    fn list_active(&self) -> impl Future<Output = WardResult<Vec<Department>>> + Send;
    fn list_by_module(
        &self,
        module_id: Uuid,
    ) -> impl Future<Output = WardResult<Vec<Department>>> + Send;
}

pub trait ServiceRepository: Send + Sync {
    fn create(&self, input: CreateService) -> impl Future<Output = WardResult<Service>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardResult<Service>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = WardResult<Service>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateService,
    ) -> impl Future<Output = WardResult<Service>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WardResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WardResult<PaginatedResult<Service>>> + Send;
    fn list_active(&self) -> impl Future<Output = WardResult<Vec<Service>>> + Send;
    fn list_by_department(
        &self,
        department_id: Uuid,
    ) -> impl Future<Output = WardResult<Vec<Service>>> + Send;
}

pub trait ScopeRepository: Send + Sync {
    fn create(&self, input: CreateScope) -> impl Future<Output = WardResult<Scope>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardResult<Scope>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = WardResult<Scope>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateScope,
    ) -> impl Future<Output = WardResult<Scope>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WardResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WardResult<PaginatedResult<Scope>>> + Send;
    /// All scopes, highest priority first.
    fn list_active(&self) -> impl Future<Output = WardResult<Vec<Scope>>> + Send;
}

// ---------------------------------------------------------------------------
// Role / permission graph
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = WardResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardResult<Role>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = WardResult<Role>> + Send;
    fn update(&self, id: Uuid, input: UpdateRole)
    -> impl Future<Output = WardResult<Role>> + Send;
    /// Delete the role together with its role→permission and user→role rows.
    fn delete(&self, id: Uuid) -> impl Future<Output = WardResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WardResult<PaginatedResult<Role>>> + Send;
    /// Every role, ordered for stable tree reconstruction.
    fn list_all(&self) -> impl Future<Output = WardResult<Vec<Role>>> + Send;
    /// Direct children of a role.
    fn get_children(&self, parent_id: Uuid) -> impl Future<Output = WardResult<Vec<Role>>> + Send;
    /// Users holding an active (non-revoked) grant of this role.
    fn list_holders(&self, role_id: Uuid) -> impl Future<Output = WardResult<Vec<Uuid>>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = WardResult<Permission>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardResult<Permission>> + Send;
    fn get_by_key(&self, key: &str) -> impl Future<Output = WardResult<Permission>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePermission,
    ) -> impl Future<Output = WardResult<Permission>> + Send;
    /// Delete the permission together with every grant referencing it.
    fn delete(&self, id: Uuid) -> impl Future<Output = WardResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WardResult<PaginatedResult<Permission>>> + Send;

    /// Grant a permission to a role. Granting twice is a no-op.
    fn grant_to_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = WardResult<()>> + Send;

    /// Revoke a permission from a role. Revoking a missing grant is a no-op.
    fn revoke_from_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = WardResult<()>> + Send;

    /// All permissions granted to a role.
    fn get_role_permissions(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = WardResult<Vec<Permission>>> + Send;

    /// Users whose effective set contains this permission, through an
    /// active role grant or a direct grant.
    fn list_affected_users(
        &self,
        permission_id: Uuid,
    ) -> impl Future<Output = WardResult<Vec<Uuid>>> + Send;
}

/// User-facing grants: user → role and user → permission.
pub trait GrantRepository: Send + Sync {
    /// Assign a role. An active assignment already present is left as is.
    fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = WardResult<()>> + Send;

    /// Soft-revoke every active assignment of the role to the user.
    fn revoke_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = WardResult<()>> + Send;

    /// Active and revoked role assignments of a user, oldest first.
    fn get_user_role_grants(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = WardResult<Vec<UserRoleGrant>>> + Send;

    /// Roles the user currently holds.
    fn get_user_roles(&self, user_id: Uuid) -> impl Future<Output = WardResult<Vec<Role>>> + Send;

    /// Grant a permission directly. Granting twice is a no-op.
    fn grant_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = WardResult<()>> + Send;

    fn revoke_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = WardResult<()>> + Send;

    /// Permissions granted directly to the user.
    fn get_user_permissions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = WardResult<Vec<Permission>>> + Send;
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Source of truth for a user's effective permission strings.
///
/// Implementations return the union of role-derived and directly granted
/// permission keys in one round trip, without duplicates.
pub trait PermissionSource: Send + Sync {
    fn effective_permissions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = WardResult<HashSet<String>>> + Send;
}
