//! Module domain model.
//!
//! Modules are the top of the organizational hierarchy. Every department
//! belongs to exactly one module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    pub id: Uuid,
    /// Globally unique code (e.g., `content`). Used as the first
    /// permission segment.
    pub code: String,
    pub name: String,
    pub display_name: String,
    pub is_active: bool,
    /// System modules are immutable through the admin use cases.
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModule {
    pub code: String,
    pub name: String,
    pub display_name: String,
    pub is_active: bool,
    /// Honoured only by the seed path; admin use cases force `false`.
    pub is_system: bool,
}

/// Fields that can be updated on an existing module.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateModule {
    pub code: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
}
