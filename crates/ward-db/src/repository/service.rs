//! SurrealDB implementation of [`ServiceRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::service::{CreateService, Service, UpdateService};
use ward_core::repository::{PaginatedResult, Pagination, ServiceRepository};

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "service";

#[derive(Debug, SurrealValue)]
struct ServiceRow {
    department_id: String,
    code: String,
    name: String,
    endpoint: String,
    is_active: bool,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    fn try_into_service(self, id: Uuid) -> Result<Service, DbError> {
        Ok(Service {
            id,
            department_id: parse_uuid(ENTITY, "department", &self.department_id)?,
            code: self.code,
            name: self.name,
            endpoint: self.endpoint,
            is_active: self.is_active,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ServiceRowWithId {
    record_id: String,
    department_id: String,
    code: String,
    name: String,
    endpoint: String,
    is_active: bool,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRowWithId {
    fn try_into_service(self) -> Result<Service, DbError> {
        Ok(Service {
            id: parse_uuid(ENTITY, "id", &self.record_id)?,
            department_id: parse_uuid(ENTITY, "department", &self.department_id)?,
            code: self.code,
            name: self.name,
            endpoint: self.endpoint,
            is_active: self.is_active,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Service repository.
#[derive(Clone)]
pub struct SurrealServiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ServiceRepository for SurrealServiceRepository<C> {
    async fn create(&self, input: CreateService) -> WardResult<Service> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('service', $id) SET \
                 department_id = $department_id, code = $code, \
                 name = $name, endpoint = $endpoint, \
                 is_active = $is_active, is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("department_id", input.department_id.to_string()))
            .bind(("code", input.code))
            .bind(("name", input.name))
            .bind(("endpoint", input.endpoint))
            .bind(("is_active", input.is_active))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<ServiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_service(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> WardResult<Service> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('service', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_service(id).map_err(Into::into)
    }

    async fn get_by_code(&self, code: &str) -> WardResult<Service> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM service WHERE code = $code")
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, code))?;

        row.try_into_service().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateService) -> WardResult<Service> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.department_id.is_some() {
            sets.push("department_id = $department_id");
        }
        if input.code.is_some() {
            sets.push("code = $code");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.endpoint.is_some() {
            sets.push("endpoint = $endpoint");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('service', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(department_id) = input.department_id {
            builder = builder.bind(("department_id", department_id.to_string()));
        }
        if let Some(code) = input.code {
            builder = builder.bind(("code", code));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(endpoint) = input.endpoint {
            builder = builder.bind(("endpoint", endpoint));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<ServiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row.try_into_service(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> WardResult<()> {
        self.db
            .query("DELETE type::record('service', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Service>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM service GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_service())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_active(&self) -> WardResult<Vec<Service>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service \
                 WHERE is_active = true \
                 ORDER BY created_at ASC, id ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_service())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn list_by_department(&self, department_id: Uuid) -> WardResult<Vec<Service>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service \
                 WHERE department_id = $department_id \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(("department_id", department_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_service())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
