//! Service administration.

use tracing::{info, warn};
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::service::{CreateService, Service, UpdateService};
use ward_core::repository::{DepartmentRepository, PaginatedResult, Pagination, ServiceRepository};

use crate::validation::{ensure_free, ensure_not_system, require_if_set, require_non_empty};

const ENTITY: &str = "service";

pub struct ServiceAdmin<S: ServiceRepository, D: DepartmentRepository> {
    services: S,
    departments: D,
}

impl<S: ServiceRepository, D: DepartmentRepository> ServiceAdmin<S, D> {
    pub fn new(services: S, departments: D) -> Self {
        Self {
            services,
            departments,
        }
    }

    pub async fn create(&self, mut input: CreateService) -> WardResult<Service> {
        require_non_empty("code", &input.code)?;
        require_non_empty("name", &input.name)?;
        self.departments.get_by_id(input.department_id).await?;
        ensure_free(ENTITY, &input.code, self.services.get_by_code(&input.code).await)?;

        input.is_system = false;
        let service = self.services.create(input).await?;
        info!(service_id = %service.id, code = %service.code, "Service created");
        Ok(service)
    }

    pub async fn get(&self, id: Uuid) -> WardResult<Service> {
        self.services.get_by_id(id).await
    }

    pub async fn get_by_code(&self, code: &str) -> WardResult<Service> {
        self.services.get_by_code(code).await
    }

    pub async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Service>> {
        self.services.list(pagination).await
    }

    pub async fn list_active(&self) -> WardResult<Vec<Service>> {
        self.services.list_active().await
    }

    pub async fn list_by_department(&self, department_id: Uuid) -> WardResult<Vec<Service>> {
        self.services.list_by_department(department_id).await
    }

    pub async fn update(&self, id: Uuid, input: UpdateService) -> WardResult<Service> {
        let current = self.services.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        require_if_set("code", input.code.as_ref())?;
        require_if_set("name", input.name.as_ref())?;
        if let Some(department_id) = input.department_id {
            self.departments.get_by_id(department_id).await?;
        }
        if let Some(code) = input.code.as_deref().filter(|c| *c != current.code) {
            ensure_free(ENTITY, code, self.services.get_by_code(code).await)?;
        }

        let service = self.services.update(id, input).await?;
        info!(service_id = %id, "Service updated");
        Ok(service)
    }

    pub async fn delete(&self, id: Uuid) -> WardResult<()> {
        let current = self.services.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        self.services.delete(id).await?;
        warn!(service_id = %id, code = %current.code, "Service deleted");
        Ok(())
    }
}
