//! SurrealDB repository implementations.

mod department;
mod grant;
mod module;
mod permission;
mod role;
mod scope;
mod service;

pub use department::SurrealDepartmentRepository;
pub use grant::SurrealGrantRepository;
pub use module::SurrealModuleRepository;
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use scope::SurrealScopeRepository;
pub use service::SurrealServiceRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(entity: &str, field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt {
        entity: entity.into(),
        detail: format!("invalid {field} UUID '{raw}': {e}"),
    })
}

fn parse_opt_uuid(entity: &str, field: &str, raw: Option<&str>) -> Result<Option<Uuid>, DbError> {
    raw.map(|r| parse_uuid(entity, field, r)).transpose()
}

fn parse_uuids(entity: &str, field: &str, raw: Vec<String>) -> Result<Vec<Uuid>, DbError> {
    raw.iter().map(|r| parse_uuid(entity, field, r)).collect()
}
