//! Department administration, including the same-module parent rule.

use tracing::{info, warn};
use uuid::Uuid;
use ward_core::error::{WardError, WardResult};
use ward_core::models::department::{CreateDepartment, Department, UpdateDepartment};
use ward_core::repository::{DepartmentRepository, ModuleRepository, PaginatedResult, Pagination};

use crate::validation::{ensure_free, ensure_not_system, require_if_set, require_non_empty};

const ENTITY: &str = "department";

pub struct DepartmentAdmin<D: DepartmentRepository, M: ModuleRepository> {
    departments: D,
    modules: M,
}

impl<D: DepartmentRepository, M: ModuleRepository> DepartmentAdmin<D, M> {
    pub fn new(departments: D, modules: M) -> Self {
        Self {
            departments,
            modules,
        }
    }

    /// The parent must exist and live in `module_id`.
    async fn check_parent(&self, parent_id: Uuid, module_id: Uuid) -> WardResult<()> {
        let parent = self.departments.get_by_id(parent_id).await?;
        if parent.module_id != module_id {
            return Err(WardError::validation(format!(
                "parent department {parent_id} belongs to another module"
            )));
        }
        Ok(())
    }

    pub async fn create(&self, mut input: CreateDepartment) -> WardResult<Department> {
        require_non_empty("code", &input.code)?;
        require_non_empty("name", &input.name)?;
        self.modules.get_by_id(input.module_id).await?;
        if let Some(parent_id) = input.parent_id {
            self.check_parent(parent_id, input.module_id).await?;
        }
        ensure_free(ENTITY, &input.code, self.departments.get_by_code(&input.code).await)?;

        input.is_system = false;
        let department = self.departments.create(input).await?;
        info!(
            department_id = %department.id,
            module_id = %department.module_id,
            code = %department.code,
            "Department created"
        );
        Ok(department)
    }

    pub async fn get(&self, id: Uuid) -> WardResult<Department> {
        self.departments.get_by_id(id).await
    }

    pub async fn get_by_code(&self, code: &str) -> WardResult<Department> {
        self.departments.get_by_code(code).await
    }

    pub async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Department>> {
        self.departments.list(pagination).await
    }

    pub async fn list_active(&self) -> WardResult<Vec<Department>> {
        self.departments.list_active().await
    }

    pub async fn list_by_module(&self, module_id: Uuid) -> WardResult<Vec<Department>> {
        self.departments.list_by_module(module_id).await
    }

    pub async fn update(&self, id: Uuid, input: UpdateDepartment) -> WardResult<Department> {
        let current = self.departments.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        require_if_set("code", input.code.as_ref())?;
        require_if_set("name", input.name.as_ref())?;
        if let Some(Some(parent_id)) = input.parent_id {
            if parent_id == id {
                return Err(WardError::validation(
                    "a department cannot be its own parent",
                ));
            }
            self.check_parent(parent_id, current.module_id).await?;
        }
        if let Some(code) = input.code.as_deref().filter(|c| *c != current.code) {
            ensure_free(ENTITY, code, self.departments.get_by_code(code).await)?;
        }

        let department = self.departments.update(id, input).await?;
        info!(department_id = %id, "Department updated");
        Ok(department)
    }

    pub async fn delete(&self, id: Uuid) -> WardResult<()> {
        let current = self.departments.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        self.departments.delete(id).await?;
        warn!(
            department_id = %id,
            code = %current.code,
            "Department deleted; child departments and services are left in place"
        );
        Ok(())
    }
}
