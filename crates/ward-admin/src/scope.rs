//! Scope administration.

use tracing::info;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::scope::{CreateScope, Scope, UpdateScope};
use ward_core::repository::{PaginatedResult, Pagination, ScopeRepository};

use crate::validation::{ensure_free, ensure_not_system, require_if_set, require_non_empty};

const ENTITY: &str = "scope";

pub struct ScopeAdmin<S: ScopeRepository> {
    scopes: S,
}

impl<S: ScopeRepository> ScopeAdmin<S> {
    pub fn new(scopes: S) -> Self {
        Self { scopes }
    }

    pub async fn create(&self, mut input: CreateScope) -> WardResult<Scope> {
        require_non_empty("code", &input.code)?;
        require_non_empty("name", &input.name)?;
        ensure_free(ENTITY, &input.code, self.scopes.get_by_code(&input.code).await)?;

        input.is_system = false;
        let scope = self.scopes.create(input).await?;
        info!(scope_id = %scope.id, code = %scope.code, level = %scope.level, "Scope created");
        Ok(scope)
    }

    pub async fn get(&self, id: Uuid) -> WardResult<Scope> {
        self.scopes.get_by_id(id).await
    }

    pub async fn get_by_code(&self, code: &str) -> WardResult<Scope> {
        self.scopes.get_by_code(code).await
    }

    pub async fn list(&self, pagination: Pagination) -> WardResult<PaginatedResult<Scope>> {
        self.scopes.list(pagination).await
    }

    /// All scopes, highest priority first.
    pub async fn list_active(&self) -> WardResult<Vec<Scope>> {
        self.scopes.list_active().await
    }

    pub async fn update(&self, id: Uuid, input: UpdateScope) -> WardResult<Scope> {
        let current = self.scopes.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        require_if_set("code", input.code.as_ref())?;
        require_if_set("name", input.name.as_ref())?;
        if let Some(code) = input.code.as_deref().filter(|c| *c != current.code) {
            ensure_free(ENTITY, code, self.scopes.get_by_code(code).await)?;
        }

        let scope = self.scopes.update(id, input).await?;
        info!(scope_id = %id, "Scope updated");
        Ok(scope)
    }

    pub async fn delete(&self, id: Uuid) -> WardResult<()> {
        let current = self.scopes.get_by_id(id).await?;
        ensure_not_system(ENTITY, current.is_system)?;

        self.scopes.delete(id).await?;
        info!(scope_id = %id, "Scope deleted");
        Ok(())
    }
}
