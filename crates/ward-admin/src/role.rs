//! Role administration and role → permission assignment.

use tracing::info;
use uuid::Uuid;
use ward_authz::PermissionCache;
use ward_core::error::{WardError, WardResult};
use ward_core::models::permission::Permission;
use ward_core::models::role::{CreateRole, Role, RoleNode, UpdateRole, build_role_tree};
use ward_core::repository::{PaginatedResult, Pagination, PermissionRepository, RoleRepository};

use crate::invalidation::invalidate_users;
use crate::validation::{ensure_free, ensure_not_system, require_if_set, require_non_empty};

const ENTITY: &str = "role";

/// Role use cases. Changing what a role grants invalidates the cached
/// permission sets of every user currently holding it.
pub struct RoleAdmin<R: RoleRepository, P: PermissionRepository, C: PermissionCache> {
    roles: R,
    permissions: P,
    cache: C,
}

impl<R: RoleRepository, P: PermissionRepository, C: PermissionCache> RoleAdmin<R, P, C> {
    pub fn new(roles: R, permissions: P, cache: C) -> Self {
        Self {
            roles,
            permissions,
            cache,
        }
    }

    pub async fn create(&self, mut input: CreateRole) -> WardResult<Role> {
        require_non_empty("name", &input.name)?;
        ensure_free(ENTITY, &input.name, self.roles.get_by_name(&input.name).await)?;
        if let Some(parent_id) = input.parent_id {
            self.roles.get_by_id(parent_id).await?;
        }

        input.is_system = false;
        let role = self.roles.create(input).await?;
        info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn get(&self, id: Uuid) -> WardResult<Role> {
        self.roles.get_by_id(id).await
    }

    pub async fn get_by_name(&self, name: &str) -> WardResult<Role> {
        self.roles.get_by_name(name).await
    }

    pub async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Role>> {
        self.roles.list(pagination).await
    }

    /// Every role as a flat adjacency list (`id` → `parent_id`).
    pub async fn get_hierarchy(&self) -> WardResult<Vec<Role>> {
        self.roles.list_all().await
    }

    /// The role forest, nested.
    pub async fn get_tree(&self) -> WardResult<Vec<RoleNode>> {
        Ok(build_role_tree(self.roles.list_all().await?))
    }

    pub async fn list_permissions(&self, role_id: Uuid) -> WardResult<Vec<Permission>> {
        self.permissions.get_role_permissions(role_id).await
    }

    pub async fn update(&self, id: Uuid, input: UpdateRole) -> WardResult<Role> {
        let current = self.roles.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        require_if_set("name", input.name.as_ref())?;
        if let Some(name) = input.name.as_deref().filter(|n| *n != current.name) {
            ensure_free(ENTITY, name, self.roles.get_by_name(name).await)?;
        }
        if let Some(Some(parent_id)) = input.parent_id {
            if parent_id == id {
                return Err(WardError::validation("a role cannot be its own parent"));
            }
            self.roles.get_by_id(parent_id).await?;
        }

        let role = self.roles.update(id, input).await?;
        info!(role_id = %id, "Role updated");
        Ok(role)
    }

    /// Delete a childless, non-system role together with its grants.
    pub async fn delete(&self, id: Uuid) -> WardResult<()> {
        let current = self.roles.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        let children = self.roles.get_children(id).await?;
        if !children.is_empty() {
            return Err(WardError::conflict(
                ENTITY,
                format!("role '{}' has {} child role(s)", current.name, children.len()),
            ));
        }

        let holders = self.roles.list_holders(id).await?;
        self.roles.delete(id).await?;
        info!(role_id = %id, name = %current.name, holders = holders.len(), "Role deleted");
        invalidate_users(&self.cache, &holders, "role.delete").await;
        Ok(())
    }

    /// Grant `permission_id` to the role. Both must exist; granting twice
    /// is a no-op.
    pub async fn assign_permission(&self, role_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        self.roles.get_by_id(role_id).await?;
        self.permissions.get_by_id(permission_id).await?;

        self.permissions.grant_to_role(role_id, permission_id).await?;
        info!(%role_id, %permission_id, "Permission assigned to role");

        let holders = self.roles.list_holders(role_id).await?;
        invalidate_users(&self.cache, &holders, "role.assign_permission").await;
        Ok(())
    }

    pub async fn remove_permission(&self, role_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        self.permissions.revoke_from_role(role_id, permission_id).await?;
        info!(%role_id, %permission_id, "Permission removed from role");

        let holders = self.roles.list_holders(role_id).await?;
        invalidate_users(&self.cache, &holders, "role.remove_permission").await;
        Ok(())
    }
}
