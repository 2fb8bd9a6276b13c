//! Integration tests for the module/department/service/scope repositories.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;
use ward_core::error::WardError;
use ward_core::models::department::{CreateDepartment, UpdateDepartment};
use ward_core::models::module::{CreateModule, UpdateModule};
use ward_core::models::scope::{CreateScope, ScopeLevel, UpdateScope};
use ward_core::models::service::{CreateService, UpdateService};
use ward_core::repository::{
    DepartmentRepository, ModuleRepository, Pagination, ScopeRepository, ServiceRepository,
};
use ward_db::repository::{
    SurrealDepartmentRepository, SurrealModuleRepository, SurrealScopeRepository,
    SurrealServiceRepository,
};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ward_db::run_migrations(&db).await.unwrap();
    db
}

fn module_input(code: &str) -> CreateModule {
    CreateModule {
        code: code.into(),
        name: code.to_uppercase(),
        display_name: format!("{code} module"),
        is_active: true,
        is_system: false,
    }
}

fn department_input(module_id: Uuid, code: &str, parent_id: Option<Uuid>) -> CreateDepartment {
    CreateDepartment {
        module_id,
        code: code.into(),
        name: code.into(),
        parent_id,
        manager_id: None,
        is_active: true,
        is_system: false,
    }
}

#[tokio::test]
async fn module_crud_round_trip() {
    let db = setup().await;
    let repo = SurrealModuleRepository::new(db);

    let created = repo.create(module_input("content")).await.unwrap();
    assert_eq!(created.code, "content");
    assert!(!created.is_system);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let by_code = repo.get_by_code("content").await.unwrap();
    assert_eq!(by_code.id, created.id);

    let updated = repo
        .update(
            created.id,
            UpdateModule {
                display_name: Some("Content Platform".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Content Platform");
    assert_eq!(updated.code, "content", "untouched fields survive");
    assert!(updated.updated_at >= created.updated_at);

    repo.delete(created.id).await.unwrap();
    let err = repo.get_by_id(created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn duplicate_module_code_is_conflict() {
    let db = setup().await;
    let repo = SurrealModuleRepository::new(db);

    repo.create(module_input("billing")).await.unwrap();
    let err = repo.create(module_input("billing")).await.unwrap_err();
    assert!(matches!(err, WardError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn module_list_paginates_and_filters_active() {
    let db = setup().await;
    let repo = SurrealModuleRepository::new(db);

    for code in ["a", "b", "c"] {
        repo.create(module_input(code)).await.unwrap();
    }
    let mut inactive = module_input("d");
    inactive.is_active = false;
    repo.create(inactive).await.unwrap();

    let page = repo
        .list(Pagination {
            offset: 1,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.offset, 1);

    let active = repo.list_active().await.unwrap();
    assert_eq!(active.len(), 3);
    assert!(active.iter().all(|m| m.is_active));
}

#[tokio::test]
async fn department_tree_and_reparent() {
    let db = setup().await;
    let modules = SurrealModuleRepository::new(db.clone());
    let departments = SurrealDepartmentRepository::new(db);

    let module = modules.create(module_input("content")).await.unwrap();
    let root = departments
        .create(department_input(module.id, "editorial", None))
        .await
        .unwrap();
    let child = departments
        .create(department_input(module.id, "news", Some(root.id)))
        .await
        .unwrap();
    assert_eq!(child.parent_id, Some(root.id));
    assert_eq!(child.module_id, module.id);

    let by_module = departments.list_by_module(module.id).await.unwrap();
    assert_eq!(by_module.len(), 2);

    let manager = Uuid::new_v4();
    let detached = departments
        .update(
            child.id,
            UpdateDepartment {
                parent_id: Some(None),
                manager_id: Some(Some(manager)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(detached.parent_id, None);
    assert_eq!(detached.manager_id, Some(manager));
    assert_eq!(detached.code, "news");
}

#[tokio::test]
async fn service_moves_between_departments() {
    let db = setup().await;
    let modules = SurrealModuleRepository::new(db.clone());
    let departments = SurrealDepartmentRepository::new(db.clone());
    let services = SurrealServiceRepository::new(db);

    let module = modules.create(module_input("content")).await.unwrap();
    let editorial = departments
        .create(department_input(module.id, "editorial", None))
        .await
        .unwrap();
    let media = departments
        .create(department_input(module.id, "media", None))
        .await
        .unwrap();

    let service = services
        .create(CreateService {
            department_id: editorial.id,
            code: "posts".into(),
            name: "Posts".into(),
            endpoint: "/posts".into(),
            is_active: true,
            is_system: false,
        })
        .await
        .unwrap();

    let moved = services
        .update(
            service.id,
            UpdateService {
                department_id: Some(media.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.department_id, media.id);

    assert!(services.list_by_department(editorial.id).await.unwrap().is_empty());
    assert_eq!(services.list_by_department(media.id).await.unwrap().len(), 1);
    assert_eq!(services.get_by_code("posts").await.unwrap().endpoint, "/posts");
}

#[tokio::test]
async fn scopes_sort_by_priority() {
    let db = setup().await;
    let scopes = SurrealScopeRepository::new(db);

    for (code, level, priority) in [
        ("self", ScopeLevel::Personal, 100),
        ("org", ScopeLevel::Organization, 400),
        ("team", ScopeLevel::Team, 200),
    ] {
        scopes
            .create(CreateScope {
                code: code.into(),
                name: code.into(),
                level,
                priority,
                is_system: false,
            })
            .await
            .unwrap();
    }

    let ordered = scopes.list_active().await.unwrap();
    let codes: Vec<&str> = ordered.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, ["org", "team", "self"]);

    let team = scopes.get_by_code("team").await.unwrap();
    let updated = scopes
        .update(
            team.id,
            UpdateScope {
                level: Some(ScopeLevel::Department),
                priority: Some(500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.level, ScopeLevel::Department);
    assert_eq!(updated.priority, 500);
}
