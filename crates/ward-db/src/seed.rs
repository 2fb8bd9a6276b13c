//! System catalog seeding.
//!
//! Creates the `is_system` rows every deployment starts with. Each row is
//! looked up by its unique code first, so re-running the seed against an
//! initialized database changes nothing.

use surrealdb::{Connection, Surreal};
use tracing::info;
use ward_core::error::{WardError, WardResult};
use ward_core::models::department::CreateDepartment;
use ward_core::models::module::CreateModule;
use ward_core::models::permission::CreatePermission;
use ward_core::models::role::CreateRole;
use ward_core::models::scope::{CreateScope, ScopeLevel};
use ward_core::models::service::CreateService;
use ward_core::repository::{
    DepartmentRepository, ModuleRepository, PermissionRepository, RoleRepository,
    ScopeRepository, ServiceRepository,
};

use crate::repository::{
    SurrealDepartmentRepository, SurrealModuleRepository, SurrealPermissionRepository,
    SurrealRoleRepository, SurrealScopeRepository, SurrealServiceRepository,
};

pub const SYSTEM_MODULE: &str = "admin";
pub const SYSTEM_DEPARTMENT: &str = "system";
pub const SYSTEM_SERVICE: &str = "users";
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

const USER_ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];

const SYSTEM_SCOPES: [(&str, &str, ScopeLevel, i64); 4] = [
    ("org", "Organization", ScopeLevel::Organization, 400),
    ("dept", "Department", ScopeLevel::Department, 300),
    ("team", "Team", ScopeLevel::Team, 200),
    ("self", "Personal", ScopeLevel::Personal, 100),
];

/// Number of rows created versus found already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub existing: usize,
}

impl SeedReport {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.existing += 1;
        }
    }
}

/// Return `Some(existing)` on a hit, `None` on NotFound, and propagate
/// everything else.
fn found<T>(lookup: WardResult<T>) -> WardResult<Option<T>> {
    match lookup {
        Ok(row) => Ok(Some(row)),
        Err(WardError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Seed the system module/department/service chain, the four scopes, the
/// `super_admin` role and its user-administration permissions.
pub async fn seed_system_catalog<C: Connection>(db: &Surreal<C>) -> WardResult<SeedReport> {
    let modules = SurrealModuleRepository::new(db.clone());
    let departments = SurrealDepartmentRepository::new(db.clone());
    let services = SurrealServiceRepository::new(db.clone());
    let scopes = SurrealScopeRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db.clone());

    let mut report = SeedReport::default();

    let module = match found(modules.get_by_code(SYSTEM_MODULE).await)? {
        Some(module) => {
            report.record(false);
            module
        }
        None => {
            report.record(true);
            modules
                .create(CreateModule {
                    code: SYSTEM_MODULE.into(),
                    name: "Administration".into(),
                    display_name: "System Administration".into(),
                    is_active: true,
                    is_system: true,
                })
                .await?
        }
    };

    let department = match found(departments.get_by_code(SYSTEM_DEPARTMENT).await)? {
        Some(department) => {
            report.record(false);
            department
        }
        None => {
            report.record(true);
            departments
                .create(CreateDepartment {
                    module_id: module.id,
                    code: SYSTEM_DEPARTMENT.into(),
                    name: "System".into(),
                    parent_id: None,
                    manager_id: None,
                    is_active: true,
                    is_system: true,
                })
                .await?
        }
    };

    if found(services.get_by_code(SYSTEM_SERVICE).await)?.is_some() {
        report.record(false);
    } else {
        services
            .create(CreateService {
                department_id: department.id,
                code: SYSTEM_SERVICE.into(),
                name: "User Management".into(),
                endpoint: "/admin/users".into(),
                is_active: true,
                is_system: true,
            })
            .await?;
        report.record(true);
    }

    for (code, name, level, priority) in SYSTEM_SCOPES {
        if found(scopes.get_by_code(code).await)?.is_some() {
            report.record(false);
            continue;
        }
        scopes
            .create(CreateScope {
                code: code.into(),
                name: name.into(),
                level,
                priority,
                is_system: true,
            })
            .await?;
        report.record(true);
    }

    let role = match found(roles.get_by_name(SUPER_ADMIN_ROLE).await)? {
        Some(role) => {
            report.record(false);
            role
        }
        None => {
            report.record(true);
            roles
                .create(CreateRole {
                    name: SUPER_ADMIN_ROLE.into(),
                    display_name: "Super Administrator".into(),
                    level: 100,
                    parent_id: None,
                    is_system: true,
                })
                .await?
        }
    };

    for action in USER_ACTIONS {
        let input = CreatePermission {
            module: SYSTEM_MODULE.into(),
            department: SYSTEM_DEPARTMENT.into(),
            service: SYSTEM_SERVICE.into(),
            resource: "users".into(),
            action: action.into(),
            description: format!("{action} user accounts"),
            is_system: true,
        };
        let key = input.key()?;
        let permission = match found(permissions.get_by_key(key.as_str()).await)? {
            Some(permission) => {
                report.record(false);
                permission
            }
            None => {
                report.record(true);
                permissions.create(input).await?
            }
        };
        permissions.grant_to_role(role.id, permission.id).await?;
    }

    info!(
        created = report.created,
        existing = report.existing,
        "System catalog seeded"
    );
    Ok(report)
}
