//! SurrealDB implementation of [`PermissionRepository`].
//!
//! The canonical key is stored alongside the five segments in `perm_key`
//! and carries the unique index, so two permissions can never encode to
//! the same string.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use ward_core::codec::PermissionKey;
use ward_core::error::WardResult;
use ward_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use ward_core::repository::{PaginatedResult, Pagination, PermissionRepository};

use super::{CountRow, parse_uuid, parse_uuids};
use crate::error::DbError;

const ENTITY: &str = "permission";

fn parse_key(raw: String) -> Result<PermissionKey, DbError> {
    PermissionKey::try_from(raw).map_err(|e| DbError::Corrupt {
        entity: ENTITY.into(),
        detail: e.to_string(),
    })
}

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    module: String,
    department: String,
    service: String,
    resource: String,
    action: String,
    perm_key: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn try_into_permission(self, id: Uuid) -> Result<Permission, DbError> {
        Ok(Permission {
            id,
            module: self.module,
            department: self.department,
            service: self.service,
            resource: self.resource,
            action: self.action,
            key: parse_key(self.perm_key)?,
            description: self.description,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
pub(super) struct PermissionRowWithId {
    record_id: String,
    module: String,
    department: String,
    service: String,
    resource: String,
    action: String,
    perm_key: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRowWithId {
    pub(super) fn try_into_permission(self) -> Result<Permission, DbError> {
        Ok(Permission {
            id: parse_uuid(ENTITY, "id", &self.record_id)?,
            module: self.module,
            department: self.department,
            service: self.service,
            resource: self.resource,
            action: self.action,
            key: parse_key(self.perm_key)?,
            description: self.description,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct PairRow {
    #[allow(dead_code)]
    role_id: String,
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create(&self, input: CreatePermission) -> WardResult<Permission> {
        let key = input.key()?;
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('permission', $id) SET \
                 module = $module, department = $department, \
                 service = $service, resource = $resource, \
                 action = $action, perm_key = $perm_key, \
                 description = $description, is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("module", input.module))
            .bind(("department", input.department))
            .bind(("service", input.service))
            .bind(("resource", input.resource))
            .bind(("action", input.action))
            .bind(("perm_key", key.into_string()))
            .bind(("description", input.description))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_permission(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> WardResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_permission(id).map_err(Into::into)
    }

    async fn get_by_key(&self, key: &str) -> WardResult<Permission> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM permission WHERE perm_key = $perm_key")
            .bind(("perm_key", key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, key))?;

        row.try_into_permission().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdatePermission) -> WardResult<Permission> {
        let id_str = id.to_string();

        // A segment change has to rewrite the stored key in the same statement.
        let key = if input.touches_key() {
            let current = self.get_by_id(id).await?;
            Some(PermissionKey::from_parts(
                input.module.as_deref().unwrap_or(&current.module),
                input.department.as_deref().unwrap_or(&current.department),
                input.service.as_deref().unwrap_or(&current.service),
                input.resource.as_deref().unwrap_or(&current.resource),
                input.action.as_deref().unwrap_or(&current.action),
            )?)
        } else {
            None
        };

        let mut sets = Vec::new();
        if input.module.is_some() {
            sets.push("module = $module");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.service.is_some() {
            sets.push("service = $service");
        }
        if input.resource.is_some() {
            sets.push("resource = $resource");
        }
        if input.action.is_some() {
            sets.push("action = $action");
        }
        if key.is_some() {
            sets.push("perm_key = $perm_key");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('permission', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(module) = input.module {
            builder = builder.bind(("module", module));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
        }
        if let Some(service) = input.service {
            builder = builder.bind(("service", service));
        }
        if let Some(resource) = input.resource {
            builder = builder.bind(("resource", resource));
        }
        if let Some(action) = input.action {
            builder = builder.bind(("action", action));
        }
        if let Some(key) = key {
            builder = builder.bind(("perm_key", key.into_string()));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_permission(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> WardResult<()> {
        self.db
            .query(
                "DELETE role_permission WHERE permission_id = $id; \
                 DELETE user_permission WHERE permission_id = $id; \
                 DELETE type::record('permission', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Permission>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM permission GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn grant_to_role(&self, role_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        let role_id_str = role_id.to_string();
        let perm_id_str = permission_id.to_string();

        let mut existing = self
            .db
            .query(
                "SELECT role_id FROM role_permission \
                 WHERE role_id = $role_id AND permission_id = $perm_id",
            )
            .bind(("role_id", role_id_str.clone()))
            .bind(("perm_id", perm_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<PairRow> = existing.take(0).map_err(DbError::from)?;
        if !rows.is_empty() {
            return Ok(());
        }

        let created = self
            .db
            .query(
                "CREATE role_permission SET \
                 role_id = $role_id, permission_id = $perm_id",
            )
            .bind(("role_id", role_id_str))
            .bind(("perm_id", perm_id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("role_permission", e));

        match created {
            Ok(_) => Ok(()),
            // A concurrent grant of the same pair won the unique index.
            Err(DbError::Duplicate { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn revoke_from_role(&self, role_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        self.db
            .query(
                "DELETE role_permission WHERE \
                 role_id = $role_id AND permission_id = $perm_id",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("perm_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("role_permission", e))?;

        Ok(())
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> WardResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE meta::id(id) IN (\
                     SELECT VALUE permission_id FROM role_permission \
                     WHERE role_id = $role_id\
                 ) \
                 ORDER BY perm_key ASC",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn list_affected_users(&self, permission_id: Uuid) -> WardResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "RETURN array::union(\
                     (SELECT VALUE user_id FROM user_role \
                      WHERE revoked_at = NONE AND role_id IN (\
                          SELECT VALUE role_id FROM role_permission \
                          WHERE permission_id = $perm_id\
                      )), \
                     (SELECT VALUE user_id FROM user_permission \
                      WHERE permission_id = $perm_id)\
                 )",
            )
            .bind(("perm_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let raw: Vec<String> = result.take(0).map_err(DbError::from)?;
        parse_uuids("grant", "user", raw).map_err(Into::into)
    }
}
