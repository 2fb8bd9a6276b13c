//! Permission domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::PermissionKey;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub id: Uuid,
    pub module: String,
    pub department: String,
    pub service: String,
    pub resource: String,
    pub action: String,
    /// Canonical `module:department:service:resource:action` string.
    /// Unique across all permissions.
    pub key: PermissionKey,
    pub description: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub module: String,
    pub department: String,
    pub service: String,
    pub resource: String,
    pub action: String,
    pub description: String,
    pub is_system: bool,
}

impl CreatePermission {
    pub fn key(&self) -> crate::error::WardResult<PermissionKey> {
        PermissionKey::from_parts(
            &self.module,
            &self.department,
            &self.service,
            &self.resource,
            &self.action,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePermission {
    pub module: Option<String>,
    pub department: Option<String>,
    pub service: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub description: Option<String>,
}

impl UpdatePermission {
    /// Whether any key segment is being changed.
    pub fn touches_key(&self) -> bool {
        self.module.is_some()
            || self.department.is_some()
            || self.service.is_some()
            || self.resource.is_some()
            || self.action.is_some()
    }
}
