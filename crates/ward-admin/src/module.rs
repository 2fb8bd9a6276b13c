//! Module administration.

use tracing::{info, warn};
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::module::{CreateModule, Module, UpdateModule};
use ward_core::repository::{ModuleRepository, PaginatedResult, Pagination};

use crate::validation::{ensure_free, ensure_not_system, require_if_set, require_non_empty};

const ENTITY: &str = "module";

pub struct ModuleAdmin<M: ModuleRepository> {
    modules: M,
}

impl<M: ModuleRepository> ModuleAdmin<M> {
    pub fn new(modules: M) -> Self {
        Self { modules }
    }

    pub async fn create(&self, mut input: CreateModule) -> WardResult<Module> {
        require_non_empty("code", &input.code)?;
        require_non_empty("name", &input.name)?;
        ensure_free(ENTITY, &input.code, self.modules.get_by_code(&input.code).await)?;

        input.is_system = false;
        let module = self.modules.create(input).await?;
        info!(module_id = %module.id, code = %module.code, "Module created");
        Ok(module)
    }

    pub async fn get(&self, id: Uuid) -> WardResult<Module> {
        self.modules.get_by_id(id).await
    }

    pub async fn get_by_code(&self, code: &str) -> WardResult<Module> {
        self.modules.get_by_code(code).await
    }

    pub async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Module>> {
        self.modules.list(pagination).await
    }

    pub async fn list_active(&self) -> WardResult<Vec<Module>> {
        self.modules.list_active().await
    }

    pub async fn update(&self, id: Uuid, input: UpdateModule) -> WardResult<Module> {
        let current = self.modules.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        require_if_set("code", input.code.as_ref())?;
        require_if_set("name", input.name.as_ref())?;
        if let Some(code) = input.code.as_deref().filter(|c| *c != current.code) {
            ensure_free(ENTITY, code, self.modules.get_by_code(code).await)?;
        }

        let module = self.modules.update(id, input).await?;
        info!(module_id = %id, "Module updated");
        Ok(module)
    }

    pub async fn delete(&self, id: Uuid) -> WardResult<()> {
        let current = self.modules.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        self.modules.delete(id).await?;
        warn!(
            module_id = %id,
            code = %current.code,
            "Module deleted; departments referencing it are left in place"
        );
        Ok(())
    }
}
