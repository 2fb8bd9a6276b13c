//! SurrealDB implementation of [`GrantRepository`] and [`PermissionSource`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::models::grant::UserRoleGrant;
use ward_core::models::permission::Permission;
use ward_core::models::role::Role;
use ward_core::repository::{GrantRepository, PermissionSource};

use super::parse_uuid;
use super::permission::PermissionRowWithId;
use super::role::RoleRowWithId;
use crate::error::DbError;

const ENTITY: &str = "grant";

/// Effective permission keys of one user: role-derived through active
/// assignments, unioned with direct grants. `array::union` deduplicates,
/// and the ids are turned into record ids so only the granted permission
/// rows are fetched.
const EFFECTIVE_PERMISSIONS_QUERY: &str = "\
SELECT VALUE perm_key FROM array::map(\
    array::union(\
        (SELECT VALUE permission_id FROM role_permission WHERE role_id IN (\
            SELECT VALUE role_id FROM user_role \
            WHERE user_id = $user_id AND revoked_at = NONE\
        )), \
        (SELECT VALUE permission_id FROM user_permission WHERE user_id = $user_id)\
    ), \
    |$id| type::record('permission', $id)\
) WHERE perm_key != NONE";

#[derive(Debug, SurrealValue)]
struct UserRoleRow {
    user_id: String,
    role_id: String,
    granted_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl UserRoleRow {
    fn try_into_grant(self) -> Result<UserRoleGrant, DbError> {
        Ok(UserRoleGrant {
            user_id: parse_uuid("user_role", "user", &self.user_id)?,
            role_id: parse_uuid("user_role", "role", &self.role_id)?,
            granted_at: self.granted_at,
            revoked_at: self.revoked_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ExistsRow {
    #[allow(dead_code)]
    user_id: String,
}

/// SurrealDB implementation of user grants and permission resolution.
#[derive(Clone)]
pub struct SurrealGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn exists(
        &self,
        query: &str,
        user_id: &str,
        other: (&'static str, String),
    ) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .bind(other)
            .await?;
        let rows: Vec<ExistsRow> = result.take(0)?;
        Ok(!rows.is_empty())
    }
}

impl<C: Connection> GrantRepository for SurrealGrantRepository<C> {
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> WardResult<()> {
        let user_id_str = user_id.to_string();
        let role_id_str = role_id.to_string();

        let active = self
            .exists(
                "SELECT user_id FROM user_role \
                 WHERE user_id = $user_id AND role_id = $role_id AND revoked_at = NONE",
                &user_id_str,
                ("role_id", role_id_str.clone()),
            )
            .await?;
        if active {
            return Ok(());
        }

        self.db
            .query("CREATE user_role SET user_id = $user_id, role_id = $role_id")
            .bind(("user_id", user_id_str))
            .bind(("role_id", role_id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("user_role", e))?;

        Ok(())
    }

    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> WardResult<()> {
        self.db
            .query(
                "UPDATE user_role SET revoked_at = time::now() \
                 WHERE user_id = $user_id AND role_id = $role_id AND revoked_at = NONE",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("user_role", e))?;

        Ok(())
    }

    async fn get_user_role_grants(&self, user_id: Uuid) -> WardResult<Vec<UserRoleGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT user_id, role_id, granted_at, revoked_at FROM user_role \
                 WHERE user_id = $user_id ORDER BY granted_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRoleRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_grant())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn get_user_roles(&self, user_id: Uuid) -> WardResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE meta::id(id) IN (\
                     SELECT VALUE role_id FROM user_role \
                     WHERE user_id = $user_id AND revoked_at = NONE\
                 ) \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn grant_permission(&self, user_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        let user_id_str = user_id.to_string();
        let perm_id_str = permission_id.to_string();

        let granted = self
            .exists(
                "SELECT user_id FROM user_permission \
                 WHERE user_id = $user_id AND permission_id = $perm_id",
                &user_id_str,
                ("perm_id", perm_id_str.clone()),
            )
            .await?;
        if granted {
            return Ok(());
        }

        let created = self
            .db
            .query("CREATE user_permission SET user_id = $user_id, permission_id = $perm_id")
            .bind(("user_id", user_id_str))
            .bind(("perm_id", perm_id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("user_permission", e));

        match created {
            Ok(_) => Ok(()),
            Err(DbError::Duplicate { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn revoke_permission(&self, user_id: Uuid, permission_id: Uuid) -> WardResult<()> {
        self.db
            .query(
                "DELETE user_permission WHERE \
                 user_id = $user_id AND permission_id = $perm_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("perm_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("user_permission", e))?;

        Ok(())
    }

    async fn get_user_permissions(&self, user_id: Uuid) -> WardResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE meta::id(id) IN (\
                     SELECT VALUE permission_id FROM user_permission \
                     WHERE user_id = $user_id\
                 ) \
                 ORDER BY perm_key ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}

impl<C: Connection> PermissionSource for SurrealGrantRepository<C> {
    async fn effective_permissions(&self, user_id: Uuid) -> WardResult<HashSet<String>> {
        let mut result = self
            .db
            .query(EFFECTIVE_PERMISSIONS_QUERY)
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let keys: Vec<String> = result.take(0).map_err(|e| DbError::Query {
            entity: ENTITY.into(),
            detail: e.to_string(),
        })?;

        debug!(%user_id, count = keys.len(), "Resolved effective permissions");
        Ok(keys.into_iter().collect())
    }
}
