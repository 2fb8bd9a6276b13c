//! Integration tests for user grants and effective permission resolution.

use std::collections::HashSet;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;
use ward_core::models::permission::{CreatePermission, Permission};
use ward_core::models::role::{CreateRole, Role};
use ward_core::repository::{
    GrantRepository, PermissionRepository, PermissionSource, RoleRepository,
};
use ward_db::repository::{
    SurrealGrantRepository, SurrealPermissionRepository, SurrealRoleRepository,
};

struct Fixture {
    roles: SurrealRoleRepository<Db>,
    perms: SurrealPermissionRepository<Db>,
    grants: SurrealGrantRepository<Db>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ward_db::run_migrations(&db).await.unwrap();
    Fixture {
        roles: SurrealRoleRepository::new(db.clone()),
        perms: SurrealPermissionRepository::new(db.clone()),
        grants: SurrealGrantRepository::new(db),
    }
}

impl Fixture {
    async fn role(&self, name: &str) -> Role {
        self.roles
            .create(CreateRole {
                name: name.into(),
                display_name: name.into(),
                level: 0,
                parent_id: None,
                is_system: false,
            })
            .await
            .unwrap()
    }

    async fn permission(&self, key: &str) -> Permission {
        let parts: Vec<&str> = key.split(':').collect();
        self.perms
            .create(CreatePermission {
                module: parts[0].into(),
                department: parts[1].into(),
                service: parts[2].into(),
                resource: parts[3].into(),
                action: parts[4].into(),
                description: String::new(),
                is_system: false,
            })
            .await
            .unwrap()
    }
}

fn set(keys: &[&str]) -> HashSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn resolves_union_of_role_and_direct_grants() {
    let fx = setup().await;
    let user = Uuid::new_v4();

    let editor = fx.role("editor").await;
    let create = fx.permission("content:editorial:posts:posts:create").await;
    let read_users = fx.permission("admin:system:users:users:read").await;
    fx.permission("admin:system:users:users:delete").await;

    fx.perms.grant_to_role(editor.id, create.id).await.unwrap();
    fx.grants.assign_role(user, editor.id).await.unwrap();
    fx.grants.grant_permission(user, read_users.id).await.unwrap();

    let resolved = fx.grants.effective_permissions(user).await.unwrap();
    assert_eq!(
        resolved,
        set(&[
            "content:editorial:posts:posts:create",
            "admin:system:users:users:read",
        ])
    );
}

#[tokio::test]
async fn overlapping_grants_are_deduplicated() {
    let fx = setup().await;
    let user = Uuid::new_v4();

    let editor = fx.role("editor").await;
    let reviewer = fx.role("reviewer").await;
    let create = fx.permission("content:editorial:posts:posts:create").await;

    fx.perms.grant_to_role(editor.id, create.id).await.unwrap();
    fx.perms.grant_to_role(reviewer.id, create.id).await.unwrap();
    fx.grants.assign_role(user, editor.id).await.unwrap();
    fx.grants.assign_role(user, reviewer.id).await.unwrap();
    fx.grants.grant_permission(user, create.id).await.unwrap();

    let resolved = fx.grants.effective_permissions(user).await.unwrap();
    assert_eq!(resolved, set(&["content:editorial:posts:posts:create"]));
}

#[tokio::test]
async fn resolution_is_stable_without_changes() {
    let fx = setup().await;
    let user = Uuid::new_v4();

    let editor = fx.role("editor").await;
    let create = fx.permission("content:editorial:posts:posts:create").await;
    fx.perms.grant_to_role(editor.id, create.id).await.unwrap();
    fx.grants.assign_role(user, editor.id).await.unwrap();

    let first = fx.grants.effective_permissions(user).await.unwrap();
    let second = fx.grants.effective_permissions(user).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_user_resolves_to_empty_set() {
    let fx = setup().await;
    let resolved = fx.grants.effective_permissions(Uuid::new_v4()).await.unwrap();
    assert!(resolved.is_empty());
}

#[tokio::test]
async fn revoked_role_stops_contributing() {
    let fx = setup().await;
    let user = Uuid::new_v4();

    let editor = fx.role("editor").await;
    let create = fx.permission("content:editorial:posts:posts:create").await;
    fx.perms.grant_to_role(editor.id, create.id).await.unwrap();
    fx.grants.assign_role(user, editor.id).await.unwrap();

    fx.grants.revoke_role(user, editor.id).await.unwrap();

    assert!(fx.grants.effective_permissions(user).await.unwrap().is_empty());
    assert!(fx.grants.get_user_roles(user).await.unwrap().is_empty());

    let history = fx.grants.get_user_role_grants(user).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_active());
    assert!(fx.roles.list_holders(editor.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reassigning_after_revoke_creates_new_grant() {
    let fx = setup().await;
    let user = Uuid::new_v4();
    let editor = fx.role("editor").await;

    fx.grants.assign_role(user, editor.id).await.unwrap();
    fx.grants.assign_role(user, editor.id).await.unwrap();
    assert_eq!(fx.grants.get_user_role_grants(user).await.unwrap().len(), 1);

    fx.grants.revoke_role(user, editor.id).await.unwrap();
    fx.grants.assign_role(user, editor.id).await.unwrap();

    let history = fx.grants.get_user_role_grants(user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|g| g.is_active()).count(), 1);
    assert_eq!(fx.grants.get_user_roles(user).await.unwrap()[0].id, editor.id);
}

#[tokio::test]
async fn affected_users_cover_roles_and_direct_grants() {
    let fx = setup().await;
    let via_role = Uuid::new_v4();
    let direct = Uuid::new_v4();
    let revoked = Uuid::new_v4();

    let editor = fx.role("editor").await;
    let create = fx.permission("content:editorial:posts:posts:create").await;
    fx.perms.grant_to_role(editor.id, create.id).await.unwrap();

    fx.grants.assign_role(via_role, editor.id).await.unwrap();
    fx.grants.assign_role(revoked, editor.id).await.unwrap();
    fx.grants.revoke_role(revoked, editor.id).await.unwrap();
    fx.grants.grant_permission(direct, create.id).await.unwrap();
    fx.grants.grant_permission(via_role, create.id).await.unwrap();

    let affected: HashSet<Uuid> = fx
        .perms
        .list_affected_users(create.id)
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(affected, HashSet::from([via_role, direct]));
}

#[tokio::test]
async fn direct_permission_revoke() {
    let fx = setup().await;
    let user = Uuid::new_v4();
    let read = fx.permission("admin:system:users:users:read").await;

    fx.grants.grant_permission(user, read.id).await.unwrap();
    fx.grants.grant_permission(user, read.id).await.unwrap();
    assert_eq!(fx.grants.get_user_permissions(user).await.unwrap().len(), 1);

    fx.grants.revoke_permission(user, read.id).await.unwrap();
    assert!(fx.grants.effective_permissions(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_identical_grants_all_succeed() {
    let fx = setup().await;
    let user = Uuid::new_v4();
    let editor = fx.role("editor").await;
    let create = fx.permission("content:editorial:posts:posts:create").await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let perms = fx.perms.clone();
        let grants = fx.grants.clone();
        tasks.spawn(async move {
            perms.grant_to_role(editor.id, create.id).await?;
            grants.grant_permission(user, create.id).await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    assert_eq!(fx.perms.get_role_permissions(editor.id).await.unwrap().len(), 1);
    assert_eq!(fx.grants.get_user_permissions(user).await.unwrap().len(), 1);
}
