//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::role::{CreateRole, Role, UpdateRole};
use ward_core::repository::{PaginatedResult, Pagination, RoleRepository};

use super::{CountRow, parse_opt_uuid, parse_uuid, parse_uuids};
use crate::error::DbError;

const ENTITY: &str = "role";

#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
    display_name: String,
    level: i64,
    parent_id: Option<String>,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self, id: Uuid) -> Result<Role, DbError> {
        Ok(Role {
            id,
            name: self.name,
            display_name: self.display_name,
            level: self.level,
            parent_id: parse_opt_uuid(ENTITY, "parent", self.parent_id.as_deref())?,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
pub(super) struct RoleRowWithId {
    record_id: String,
    name: String,
    display_name: String,
    level: i64,
    parent_id: Option<String>,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    pub(super) fn try_into_role(self) -> Result<Role, DbError> {
        let id = parse_uuid(ENTITY, "id", &self.record_id)?;
        RoleRow {
            name: self.name,
            display_name: self.display_name,
            level: self.level,
            parent_id: self.parent_id,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .try_into_role(id)
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> WardResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 name = $name, display_name = $display_name, \
                 level = $level, parent_id = $parent_id, \
                 is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("display_name", input.display_name))
            .bind(("level", input.level))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_role(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> WardResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_role(id).map_err(Into::into)
    }

    async fn get_by_name(&self, name: &str) -> WardResult<Role> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM role WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, name))?;

        row.try_into_role().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> WardResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.level.is_some() {
            sets.push("level = $level");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(level) = input.level {
            builder = builder.bind(("level", level));
        }
        if let Some(parent_id) = input.parent_id {
            // Some(None) clears the parent and makes the role a root.
            builder = builder.bind(("parent_id", parent_id.map(|p| p.to_string())));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_role(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> WardResult<()> {
        // Association rows go first so no grant ever points at a missing role.
        self.db
            .query(
                "DELETE role_permission WHERE role_id = $id; \
                 DELETE user_role WHERE role_id = $id; \
                 DELETE type::record('role', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Role>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM role GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_all(&self) -> WardResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 ORDER BY created_at ASC, id ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn get_children(&self, parent_id: Uuid) -> WardResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE parent_id = $parent_id \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn list_holders(&self, role_id: Uuid) -> WardResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "RETURN array::distinct((\
                     SELECT VALUE user_id FROM user_role \
                     WHERE role_id = $role_id AND revoked_at = NONE\
                 ))",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let raw: Vec<String> = result.take(0).map_err(DbError::from)?;
        parse_uuids("user_role", "user", raw).map_err(Into::into)
    }
}
