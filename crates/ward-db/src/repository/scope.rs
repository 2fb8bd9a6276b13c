//! SurrealDB implementation of [`ScopeRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::scope::{CreateScope, Scope, ScopeLevel, UpdateScope};
use ward_core::repository::{PaginatedResult, Pagination, ScopeRepository};

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "scope";

fn parse_level(raw: &str) -> Result<ScopeLevel, DbError> {
    raw.parse().map_err(|_| DbError::Corrupt {
        entity: ENTITY.into(),
        detail: format!("unknown level '{raw}'"),
    })
}

#[derive(Debug, SurrealValue)]
struct ScopeRow {
    code: String,
    name: String,
    level: String,
    priority: i64,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScopeRow {
    fn try_into_scope(self, id: Uuid) -> Result<Scope, DbError> {
        Ok(Scope {
            id,
            code: self.code,
            name: self.name,
            level: parse_level(&self.level)?,
            priority: self.priority,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ScopeRowWithId {
    record_id: String,
    code: String,
    name: String,
    level: String,
    priority: i64,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScopeRowWithId {
    fn try_into_scope(self) -> Result<Scope, DbError> {
        let id = parse_uuid(ENTITY, "id", &self.record_id)?;
        ScopeRow {
            code: self.code,
            name: self.name,
            level: self.level,
            priority: self.priority,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .try_into_scope(id)
    }
}

/// SurrealDB implementation of the Scope repository.
#[derive(Clone)]
pub struct SurrealScopeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScopeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScopeRepository for SurrealScopeRepository<C> {
    async fn create(&self, input: CreateScope) -> WardResult<Scope> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('scope', $id) SET \
                 code = $code, name = $name, level = $level, \
                 priority = $priority, is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", input.code))
            .bind(("name", input.name))
            .bind(("level", input.level.as_str().to_string()))
            .bind(("priority", input.priority))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<ScopeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_scope(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> WardResult<Scope> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('scope', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_scope(id).map_err(Into::into)
    }

    async fn get_by_code(&self, code: &str) -> WardResult<Scope> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM scope WHERE code = $code")
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, code))?;

        row.try_into_scope().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateScope) -> WardResult<Scope> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.code.is_some() {
            sets.push("code = $code");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.level.is_some() {
            sets.push("level = $level");
        }
        if input.priority.is_some() {
            sets.push("priority = $priority");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('scope', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(code) = input.code {
            builder = builder.bind(("code", code));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(level) = input.level {
            builder = builder.bind(("level", level.as_str().to_string()));
        }
        if let Some(priority) = input.priority {
            builder = builder.bind(("priority", priority));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<ScopeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_scope(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> WardResult<()> {
        self.db
            .query("DELETE type::record('scope', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Scope>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM scope GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scope \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_scope())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_active(&self) -> WardResult<Vec<Scope>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scope \
                 ORDER BY priority DESC, created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_scope())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
