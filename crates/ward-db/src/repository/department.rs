//! SurrealDB implementation of [`DepartmentRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::department::{CreateDepartment, Department, UpdateDepartment};
use ward_core::repository::{DepartmentRepository, PaginatedResult, Pagination};

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "department";

#[derive(Debug, SurrealValue)]
struct DepartmentRow {
    module_id: String,
    code: String,
    name: String,
    parent_id: Option<String>,
    manager_id: Option<String>,
    is_active: bool,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DepartmentRowWithId {
    record_id: String,
    module_id: String,
    code: String,
    name: String,
    parent_id: Option<String>,
    manager_id: Option<String>,
    is_active: bool,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DepartmentRowWithId {
    fn try_into_department(self) -> Result<Department, DbError> {
        let id = parse_uuid(ENTITY, "id", &self.record_id)?;
        row_to_department(
            DepartmentRow {
                module_id: self.module_id,
                code: self.code,
                name: self.name,
                parent_id: self.parent_id,
                manager_id: self.manager_id,
                is_active: self.is_active,
                is_system: self.is_system,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

fn row_to_department(row: DepartmentRow, id: Uuid) -> Result<Department, DbError> {
    Ok(Department {
        id,
        module_id: parse_uuid(ENTITY, "module", &row.module_id)?,
        code: row.code,
        name: row.name,
        parent_id: parse_opt_uuid(ENTITY, "parent", row.parent_id.as_deref())?,
        manager_id: parse_opt_uuid(ENTITY, "manager", row.manager_id.as_deref())?,
        is_active: row.is_active,
        is_system: row.is_system,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// SurrealDB implementation of the Department repository.
#[derive(Clone)]
pub struct SurrealDepartmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDepartmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_many(
        &self,
        query: &str,
        binding: Option<(&'static str, String)>,
    ) -> Result<Vec<Department>, DbError> {
        let mut builder = self.db.query(query);
        if let Some(binding) = binding {
            builder = builder.bind(binding);
        }
        let mut result = builder.await?;
        let rows: Vec<DepartmentRowWithId> = result.take(0)?;
        rows.into_iter()
            .map(|row| row.try_into_department())
            .collect()
    }
}

impl<C: Connection> DepartmentRepository for SurrealDepartmentRepository<C> {
    async fn create(&self, input: CreateDepartment) -> WardResult<Department> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('department', $id) SET \
                 module_id = $module_id, code = $code, name = $name, \
                 parent_id = $parent_id, manager_id = $manager_id, \
                 is_active = $is_active, is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("module_id", input.module_id.to_string()))
            .bind(("code", input.code))
            .bind(("name", input.name))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("manager_id", input.manager_id.map(|m| m.to_string())))
            .bind(("is_active", input.is_active))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row_to_department(row, id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> WardResult<Department> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('department', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row_to_department(row, id).map_err(Into::into)
    }

    async fn get_by_code(&self, code: &str) -> WardResult<Department> {
        let found = self
            .select_many(
                "SELECT meta::id(id) AS record_id, * FROM department WHERE code = $code",
                Some(("code", code.to_string())),
            )
            .await?;

        found
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, code).into())
    }

    async fn update(&self, id: Uuid, input: UpdateDepartment) -> WardResult<Department> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.code.is_some() {
            sets.push("code = $code");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        if input.manager_id.is_some() {
            sets.push("manager_id = $manager_id");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('department', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(code) = input.code {
            builder = builder.bind(("code", code));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(parent_id) = input.parent_id {
            builder = builder.bind(("parent_id", parent_id.map(|p| p.to_string())));
        }
        if let Some(manager_id) = input.manager_id {
            builder = builder.bind(("manager_id", manager_id.map(|m| m.to_string())));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, &id_str))?;

        row_to_department(row, id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> WardResult<()> {
        self.db
            .query("DELETE type::record('department', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement(ENTITY, e))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Department>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM department GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM department \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_department())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_active(&self) -> WardResult<Vec<Department>> {
        self.select_many(
            "SELECT meta::id(id) AS record_id, * FROM department \
             WHERE is_active = true \
             ORDER BY created_at ASC, id ASC",
            None,
        )
        .await
        .map_err(Into::into)
    }

    async fn list_by_module(&self, module_id: Uuid) -> WardResult<Vec<Department>> {
        self.select_many(
            "SELECT meta::id(id) AS record_id, * FROM department \
             WHERE module_id = $module_id \
             ORDER BY created_at ASC, id ASC",
            Some(("module_id", module_id.to_string())),
        )
        .await
        .map_err(Into::into)
    }
}
