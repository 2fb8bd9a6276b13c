//! Integration tests for Role and Permission repositories using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use ward_core::error::WardError;
use ward_core::models::permission::{CreatePermission, UpdatePermission};
use ward_core::models::role::{CreateRole, UpdateRole, build_role_tree};
use ward_core::repository::{GrantRepository, Pagination, PermissionRepository, RoleRepository};
use ward_db::repository::{
    SurrealGrantRepository, SurrealPermissionRepository, SurrealRoleRepository,
};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ward_db::run_migrations(&db).await.unwrap();
    db
}

fn role_input(name: &str, parent_id: Option<uuid::Uuid>) -> CreateRole {
    CreateRole {
        name: name.into(),
        display_name: name.into(),
        level: 10,
        parent_id,
        is_system: false,
    }
}

fn permission_input(resource: &str, action: &str) -> CreatePermission {
    CreatePermission {
        module: "content".into(),
        department: "editorial".into(),
        service: "posts".into(),
        resource: resource.into(),
        action: action.into(),
        description: String::new(),
        is_system: false,
    }
}

#[tokio::test]
async fn role_children_and_tree() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db);

    let admin = roles.create(role_input("admin", None)).await.unwrap();
    let editor = roles.create(role_input("editor", Some(admin.id))).await.unwrap();
    let writer = roles.create(role_input("writer", Some(editor.id))).await.unwrap();

    let children = roles.get_children(admin.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, editor.id);

    let tree = build_role_tree(roles.list_all().await.unwrap());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children[0].children[0].role.id, writer.id);

    let page = roles.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn role_can_be_made_root() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db);

    let admin = roles.create(role_input("admin", None)).await.unwrap();
    let editor = roles.create(role_input("editor", Some(admin.id))).await.unwrap();

    let updated = roles
        .update(
            editor.id,
            UpdateRole {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.parent_id, None);
    assert_eq!(roles.get_by_name("editor").await.unwrap().parent_id, None);
}

#[tokio::test]
async fn permission_key_is_derived_and_unique() {
    let db = setup().await;
    let perms = SurrealPermissionRepository::new(db);

    let created = perms.create(permission_input("posts", "create")).await.unwrap();
    assert_eq!(created.key.as_str(), "content:editorial:posts:posts:create");

    let fetched = perms
        .get_by_key("content:editorial:posts:posts:create")
        .await
        .unwrap();
    assert_eq!(fetched.id, created.id);

    let err = perms.create(permission_input("posts", "create")).await.unwrap_err();
    assert!(matches!(err, WardError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn permission_update_rewrites_key() {
    let db = setup().await;
    let perms = SurrealPermissionRepository::new(db);

    let created = perms.create(permission_input("posts", "create")).await.unwrap();
    let updated = perms
        .update(
            created.id,
            UpdatePermission {
                action: Some("publish".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.action, "publish");
    assert_eq!(updated.key.as_str(), "content:editorial:posts:posts:publish");
    assert!(
        perms
            .get_by_key("content:editorial:posts:posts:create")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn grant_to_role_is_idempotent() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db);

    let editor = roles.create(role_input("editor", None)).await.unwrap();
    let create = perms.create(permission_input("posts", "create")).await.unwrap();
    let read = perms.create(permission_input("posts", "read")).await.unwrap();

    perms.grant_to_role(editor.id, create.id).await.unwrap();
    perms.grant_to_role(editor.id, create.id).await.unwrap();
    perms.grant_to_role(editor.id, read.id).await.unwrap();

    let granted = perms.get_role_permissions(editor.id).await.unwrap();
    assert_eq!(granted.len(), 2);

    perms.revoke_from_role(editor.id, create.id).await.unwrap();
    perms.revoke_from_role(editor.id, create.id).await.unwrap();
    let granted = perms.get_role_permissions(editor.id).await.unwrap();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].id, read.id);
}

#[tokio::test]
async fn role_delete_cascades_grants() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db.clone());
    let grants = SurrealGrantRepository::new(db);

    let editor = roles.create(role_input("editor", None)).await.unwrap();
    let create = perms.create(permission_input("posts", "create")).await.unwrap();
    perms.grant_to_role(editor.id, create.id).await.unwrap();

    let user = uuid::Uuid::new_v4();
    grants.assign_role(user, editor.id).await.unwrap();
    assert_eq!(roles.list_holders(editor.id).await.unwrap(), vec![user]);

    roles.delete(editor.id).await.unwrap();

    assert!(roles.get_by_id(editor.id).await.unwrap_err().is_not_found());
    assert!(perms.get_role_permissions(editor.id).await.unwrap().is_empty());
    assert!(grants.get_user_role_grants(user).await.unwrap().is_empty());
    assert!(perms.list_affected_users(create.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn permission_delete_cascades_grants() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db.clone());
    let grants = SurrealGrantRepository::new(db);

    let editor = roles.create(role_input("editor", None)).await.unwrap();
    let create = perms.create(permission_input("posts", "create")).await.unwrap();
    perms.grant_to_role(editor.id, create.id).await.unwrap();

    let user = uuid::Uuid::new_v4();
    grants.grant_permission(user, create.id).await.unwrap();

    perms.delete(create.id).await.unwrap();

    assert!(perms.get_role_permissions(editor.id).await.unwrap().is_empty());
    assert!(grants.get_user_permissions(user).await.unwrap().is_empty());
}
