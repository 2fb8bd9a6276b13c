//! Service domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: Uuid,
    pub department_id: Uuid,
    pub code: String,
    pub name: String,
    /// Base endpoint the service is reachable at (informational).
    pub endpoint: String,
    pub is_active: bool,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub department_id: Uuid,
    pub code: String,
    pub name: String,
    pub endpoint: String,
    pub is_active: bool,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateService {
    pub department_id: Option<Uuid>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub is_active: Option<bool>,
}
