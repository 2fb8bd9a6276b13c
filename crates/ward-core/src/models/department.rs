//! Department domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A department inside a module. Departments nest through `parent_id`;
/// a parent always belongs to the same module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: Uuid,
    pub module_id: Uuid,
    pub code: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
    /// Opaque identity of the managing user, if any.
    pub manager_id: Option<Uuid>,
    pub is_active: bool,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartment {
    pub module_id: Uuid,
    pub code: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub is_active: bool,
    /// Honoured only by the seed path; admin use cases force `false`.
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDepartment {
    pub code: Option<String>,
    pub name: Option<String>,
    /// `Some(Some(id))` = reparent, `Some(None)` = detach, `None` = no change.
    pub parent_id: Option<Option<Uuid>>,
    /// `Some(Some(id))` = set, `Some(None)` = clear, `None` = no change.
    pub manager_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}
