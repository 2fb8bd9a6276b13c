//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings; the record key of every entity is its UUID string. Enums are
//! stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "hierarchy_and_grants",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Modules (top of the hierarchy)
-- =======================================================================
DEFINE TABLE module SCHEMAFULL;
DEFINE FIELD code ON TABLE module TYPE string;
DEFINE FIELD name ON TABLE module TYPE string;
DEFINE FIELD display_name ON TABLE module TYPE string;
DEFINE FIELD is_active ON TABLE module TYPE bool DEFAULT true;
DEFINE FIELD is_system ON TABLE module TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_module_code ON TABLE module COLUMNS code UNIQUE;

-- =======================================================================
-- Departments (module scope, self-referencing tree)
-- =======================================================================
DEFINE TABLE department SCHEMAFULL;
DEFINE FIELD module_id ON TABLE department TYPE string;
DEFINE FIELD code ON TABLE department TYPE string;
DEFINE FIELD name ON TABLE department TYPE string;
DEFINE FIELD parent_id ON TABLE department TYPE option<string>;
DEFINE FIELD manager_id ON TABLE department TYPE option<string>;
DEFINE FIELD is_active ON TABLE department TYPE bool DEFAULT true;
DEFINE FIELD is_system ON TABLE department TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE department TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE department TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_department_code ON TABLE department \
    COLUMNS code UNIQUE;
DEFINE INDEX idx_department_module ON TABLE department \
    COLUMNS module_id;
DEFINE INDEX idx_department_parent ON TABLE department \
    COLUMNS parent_id;

-- =======================================================================
-- Services (department scope)
-- =======================================================================
DEFINE TABLE service SCHEMAFULL;
DEFINE FIELD department_id ON TABLE service TYPE string;
DEFINE FIELD code ON TABLE service TYPE string;
DEFINE FIELD name ON TABLE service TYPE string;
DEFINE FIELD endpoint ON TABLE service TYPE string;
DEFINE FIELD is_active ON TABLE service TYPE bool DEFAULT true;
DEFINE FIELD is_system ON TABLE service TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE service TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE service TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_service_code ON TABLE service COLUMNS code UNIQUE;
DEFINE INDEX idx_service_department ON TABLE service \
    COLUMNS department_id;

-- =======================================================================
-- Scopes (independent breadth-of-access dimension)
-- =======================================================================
DEFINE TABLE scope SCHEMAFULL;
DEFINE FIELD code ON TABLE scope TYPE string;
DEFINE FIELD name ON TABLE scope TYPE string;
DEFINE FIELD level ON TABLE scope TYPE string \
    ASSERT $value IN ['organization', 'department', 'team', 'personal'];
DEFINE FIELD priority ON TABLE scope TYPE int DEFAULT 0;
DEFINE FIELD is_system ON TABLE scope TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE scope TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE scope TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_scope_code ON TABLE scope COLUMNS code UNIQUE;

-- =======================================================================
-- Roles (self-referencing tree)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD display_name ON TABLE role TYPE string;
DEFINE FIELD level ON TABLE role TYPE int DEFAULT 0;
DEFINE FIELD parent_id ON TABLE role TYPE option<string>;
DEFINE FIELD is_system ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;
DEFINE INDEX idx_role_parent ON TABLE role COLUMNS parent_id;

-- =======================================================================
-- Permissions (5-tuple, unique by canonical key)
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD module ON TABLE permission TYPE string;
DEFINE FIELD department ON TABLE permission TYPE string;
DEFINE FIELD service ON TABLE permission TYPE string;
DEFINE FIELD resource ON TABLE permission TYPE string;
DEFINE FIELD action ON TABLE permission TYPE string;
DEFINE FIELD perm_key ON TABLE permission TYPE string;
DEFINE FIELD description ON TABLE permission TYPE string DEFAULT '';
DEFINE FIELD is_system ON TABLE permission TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_key ON TABLE permission \
    COLUMNS perm_key UNIQUE;

-- =======================================================================
-- Association tables
-- =======================================================================
DEFINE TABLE role_permission SCHEMAFULL;
DEFINE FIELD role_id ON TABLE role_permission TYPE string;
DEFINE FIELD permission_id ON TABLE role_permission TYPE string;
DEFINE FIELD created_at ON TABLE role_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_permission_pair ON TABLE role_permission \
    COLUMNS role_id, permission_id UNIQUE;
DEFINE INDEX idx_role_permission_permission ON TABLE role_permission \
    COLUMNS permission_id;

-- User -> Role assignment, soft-revocable
DEFINE TABLE user_role SCHEMAFULL;
DEFINE FIELD user_id ON TABLE user_role TYPE string;
DEFINE FIELD role_id ON TABLE user_role TYPE string;
DEFINE FIELD granted_at ON TABLE user_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD revoked_at ON TABLE user_role TYPE option<datetime>;
DEFINE INDEX idx_user_role_user ON TABLE user_role COLUMNS user_id;
DEFINE INDEX idx_user_role_role ON TABLE user_role COLUMNS role_id;

-- User -> Permission direct grants
DEFINE TABLE user_permission SCHEMAFULL;
DEFINE FIELD user_id ON TABLE user_permission TYPE string;
DEFINE FIELD permission_id ON TABLE user_permission TYPE string;
DEFINE FIELD granted_at ON TABLE user_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_permission_pair ON TABLE user_permission \
    COLUMNS user_id, permission_id UNIQUE;
DEFINE INDEX idx_user_permission_permission ON TABLE user_permission \
    COLUMNS permission_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

impl Migration {
    /// The migration's DDL and its `_migration` row as one transaction, so
    /// a failed migration leaves neither behind.
    fn transaction(&self) -> String {
        format!(
            "BEGIN TRANSACTION;\n{}\nCREATE _migration SET version = {}, name = '{}';\n\
             COMMIT TRANSACTION;",
            self.sql, self.version, self.name
        )
    }
}

/// Highest applied migration version, 0 on a fresh database.
async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT VALUE version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let versions: Vec<u32> = result.take(0)?;
    Ok(versions.first().copied().unwrap_or(0))
}

/// Bring the schema up to date and return how many migrations ran.
///
/// Safe to call on every startup: versions at or below the recorded
/// maximum are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<usize, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("tracking table: {e}")))?;

    let from = current_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        info!(version = from, "Schema up to date");
        return Ok(0);
    }

    for migration in &pending {
        db.query(migration.transaction())
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!("v{} '{}': {e}", migration.version, migration.name))
            })?;
        info!(
            version = migration.version,
            name = migration.name,
            "Applied migration"
        );
    }

    Ok(pending.len())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
