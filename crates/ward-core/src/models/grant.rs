//! Grant associations between users, roles and permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user → role assignment. Revocation is soft: the row stays with
/// `revoked_at` set and no longer contributes permissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRoleGrant {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub granted_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl UserRoleGrant {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// A permission granted directly to a user, bypassing roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPermissionGrant {
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub granted_at: DateTime<Utc>,
}
