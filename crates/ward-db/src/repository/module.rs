//! SurrealDB implementation of [`ModuleRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::module::{CreateModule, Module, UpdateModule};
use ward_core::repository::{ModuleRepository, PaginatedResult, Pagination};

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "module";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ModuleRow {
    code: String,
    name: String,
    display_name: String,
    is_active: bool,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRow {
    fn into_module(self, id: Uuid) -> Module {
        Module {
            id,
            code: self.code,
            name: self.name,
            display_name: self.display_name,
            is_active: self.is_active,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ModuleRowWithId {
    record_id: String,
    code: String,
    name: String,
    display_name: String,
    is_active: bool,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRowWithId {
    fn try_into_module(self) -> Result<Module, DbError> {
        Ok(Module {
            id: parse_uuid(ENTITY, "id", &self.record_id)?,
            code: self.code,
            name: self.name,
            display_name: self.display_name,
            is_active: self.is_active,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Module repository.
#[derive(Clone)]
pub struct SurrealModuleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealModuleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ModuleRepository for SurrealModuleRepository<C> {
    async fn create(&self, input: CreateModule) -> WardResult<Module> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('module', $id) SET \
                 code = $code, name = $name, \
                 display_name = $display_name, \
                 is_active = $is_active, is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", input.code))
            .bind(("name", input.name))
            .bind(("display_name", input.display_name))
            .bind(("is_active", input.is_active))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<ModuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        Ok(row.into_module(id))
    }

    async fn get_by_id(&self, id: Uuid) -> WardResult<Module> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('module', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        Ok(row.into_module(id))
    }

    async fn get_by_code(&self, code: &str) -> WardResult<Module> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM module WHERE code = $code")
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, code))?;

        row.try_into_module().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateModule) -> WardResult<Module> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.code.is_some() {
            sets.push("code = $code");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('module', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(code) = input.code {
            builder = builder.bind(("code", code));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<ModuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        Ok(row.into_module(id))
    }

    async fn delete(&self, id: Uuid) -> WardResult<()> {
        self.db
            .query("DELETE type::record('module', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Module>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM module GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM module \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_module())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_active(&self) -> WardResult<Vec<Module>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM module \
                 WHERE is_active = true \
                 ORDER BY created_at ASC, id ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_module())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
