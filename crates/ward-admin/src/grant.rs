//! User grants: role assignments and direct permissions.

use tracing::info;
use uuid::Uuid;
use ward_authz::PermissionCache;
use ward_core::error::WardResult;
use ward_core::models::grant::UserRoleGrant;
use ward_core::models::permission::Permission;
use ward_core::models::role::Role;
use ward_core::repository::{GrantRepository, PermissionRepository, RoleRepository};

use crate::invalidation::invalidate_users;

/// Grant use cases. Every mutation invalidates the user's cached set.
pub struct GrantAdmin<G, R, P, C>
where
    G: GrantRepository,
    R: RoleRepository,
    P: PermissionRepository,
    C: PermissionCache,
{
    grants: G,
    roles: R,
    permissions: P,
    cache: C,
}

impl<G, R, P, C> GrantAdmin<G, R, P, C>
where
    G: GrantRepository,
    R: RoleRepository,
    P: PermissionRepository,
    C: PermissionCache,
{
    pub fn new(grants: G, roles: R, permissions: P, cache: C) -> Self {
        Self {
            grants,
            roles,
            permissions,
            cache,
        }
    }

    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> WardResult<()> {
        self.roles.get_by_id(role_id).await?;
        self.grants.assign_role(user_id, role_id).await?;
        info!(%user_id, %role_id, "Role assigned to user");
        invalidate_users(&self.cache, &[user_id], "grant.assign_role").await;
        Ok(())
    }

    /// Soft-revoke: the assignment row is kept with its revocation time.
    pub async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> WardResult<()> {
        self.grants.revoke_role(user_id, role_id).await?;
        info!(%user_id, %role_id, "Role revoked from user");
        invalidate_users(&self.cache, &[user_id], "grant.revoke_role").await;
        Ok(())
    }

    pub async fn grant_permission(&self, user_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        self.permissions.get_by_id(permission_id).await?;
        self.grants.grant_permission(user_id, permission_id).await?;
        info!(%user_id, %permission_id, "Permission granted to user");
        invalidate_users(&self.cache, &[user_id], "grant.grant_permission").await;
        Ok(())
    }

    pub async fn revoke_permission(&self, user_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        self.grants.revoke_permission(user_id, permission_id).await?;
        info!(%user_id, %permission_id, "Permission revoked from user");
        invalidate_users(&self.cache, &[user_id], "grant.revoke_permission").await;
        Ok(())
    }

    /// Roles the user currently holds.
    pub async fn list_user_roles(&self, user_id: Uuid) -> WardResult<Vec<Role>> {
        self.grants.get_user_roles(user_id).await
    }

    /// Every role assignment of the user, revoked ones included.
    pub async fn list_user_role_grants(&self, user_id: Uuid) -> WardResult<Vec<UserRoleGrant>> {
        self.grants.get_user_role_grants(user_id).await
    }

    pub async fn list_user_permissions(&self, user_id: Uuid) -> WardResult<Vec<Permission>> {
        self.grants.get_user_permissions(user_id).await
    }
}
