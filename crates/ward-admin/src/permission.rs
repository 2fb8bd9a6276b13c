//! Permission administration.

use tracing::info;
use uuid::Uuid;
use ward_authz::PermissionCache;
use ward_core::codec::PermissionKey;
use ward_core::error::WardResult;
use ward_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use ward_core::repository::{PaginatedResult, Pagination, PermissionRepository};

use crate::invalidation::invalidate_users;
use crate::validation::{ensure_free, ensure_not_system};

const ENTITY: &str = "permission";

pub struct PermissionAdmin<P: PermissionRepository, C: PermissionCache> {
    permissions: P,
    cache: C,
}

impl<P: PermissionRepository, C: PermissionCache> PermissionAdmin<P, C> {
    pub fn new(permissions: P, cache: C) -> Self {
        Self { permissions, cache }
    }

    pub async fn create(&self, mut input: CreatePermission) -> WardResult<Permission> {
        let key = input.key()?;
        ensure_free(
            ENTITY,
            key.as_str(),
            self.permissions.get_by_key(key.as_str()).await,
        )?;

        input.is_system = false;
        let permission = self.permissions.create(input).await?;
        info!(permission_id = %permission.id, key = %permission.key, "Permission created");
        Ok(permission)
    }

    pub async fn get(&self, id: Uuid) -> WardResult<Permission> {
        self.permissions.get_by_id(id).await
    }

    pub async fn get_by_key(&self, key: &str) -> WardResult<Permission> {
        self.permissions.get_by_key(key).await
    }

    pub async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Permission>> {
        self.permissions.list(pagination).await
    }

    /// Update a permission. Changing a segment changes the key, so every
    /// user whose cached set holds the old string is invalidated.
    pub async fn update(&self, id: Uuid, input: UpdatePermission) -> WardResult<Permission> {
        let current = self.permissions.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        let key_changed = if input.touches_key() {
            let next = PermissionKey::from_parts(
                input.module.as_deref().unwrap_or(&current.module),
                input.department.as_deref().unwrap_or(&current.department),
                input.service.as_deref().unwrap_or(&current.service),
                input.resource.as_deref().unwrap_or(&current.resource),
                input.action.as_deref().unwrap_or(&current.action),
            )?;
            if next != current.key {
                ensure_free(
                    ENTITY,
                    next.as_str(),
                    self.permissions.get_by_key(next.as_str()).await,
                )?;
                true
            } else {
                false
            }
        } else {
            false
        };

        let permission = self.permissions.update(id, input).await?;
        info!(permission_id = %id, key = %permission.key, "Permission updated");

        if key_changed {
            let affected = self.permissions.list_affected_users(id).await?;
            invalidate_users(&self.cache, &affected, "permission.update").await;
        }
        Ok(permission)
    }

    /// Delete a non-system permission and every grant referencing it.
    pub async fn delete(&self, id: Uuid) -> WardResult<()> {
        let current = self.permissions.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        let affected = self.permissions.list_affected_users(id).await?;
        self.permissions.delete(id).await?;
        info!(permission_id = %id, key = %current.key, "Permission deleted");
        invalidate_users(&self.cache, &affected, "permission.delete").await;
        Ok(())
    }
}
