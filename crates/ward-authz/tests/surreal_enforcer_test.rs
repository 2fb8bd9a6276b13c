//! End-to-end enforcement against the SurrealDB permission source.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use ward_authz::{AuthzConfig, Enforcer, MemoryPermissionCache, PermissionCache};
use ward_core::error::ErrorKind;
use ward_core::models::permission::CreatePermission;
use ward_core::models::role::CreateRole;
use ward_core::repository::{GrantRepository, PermissionRepository, RoleRepository};
use ward_db::repository::{
    SurrealGrantRepository, SurrealPermissionRepository, SurrealRoleRepository,
};

#[tokio::test]
async fn enforces_role_and_direct_grants() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ward_db::run_migrations(&db).await.unwrap();
    ward_db::seed_system_catalog(&db).await.unwrap();

    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db.clone());
    let grants = SurrealGrantRepository::new(db.clone());

    let editor = roles
        .create(CreateRole {
            name: "editor".into(),
            display_name: "Editor".into(),
            level: 10,
            parent_id: None,
            is_system: false,
        })
        .await
        .unwrap();
    let create_post = perms
        .create(CreatePermission {
            module: "content".into(),
            department: "editorial".into(),
            service: "posts".into(),
            resource: "posts".into(),
            action: "create".into(),
            description: String::new(),
            is_system: false,
        })
        .await
        .unwrap();
    let read_users = perms
        .get_by_key("admin:system:users:users:read")
        .await
        .unwrap();

    let user = Uuid::new_v4();
    perms.grant_to_role(editor.id, create_post.id).await.unwrap();
    grants.assign_role(user, editor.id).await.unwrap();
    grants.grant_permission(user, read_users.id).await.unwrap();

    let config = AuthzConfig::default();
    let enforcer = Enforcer::new(
        grants.clone(),
        MemoryPermissionCache::new(config.cache_key_prefix.clone()),
        &config,
    );

    enforcer
        .require_all(
            user,
            &[
                "content:editorial:posts:posts:create",
                "admin:system:users:users:read",
            ],
        )
        .await
        .unwrap();
    let denied = enforcer
        .require_one(user, "admin:system:users:users:delete")
        .await
        .unwrap_err();
    assert_eq!(denied.kind(), ErrorKind::Forbidden);

    // Stale until invalidated.
    grants.revoke_role(user, editor.id).await.unwrap();
    enforcer
        .require_one(user, "content:editorial:posts:posts:create")
        .await
        .unwrap();

    enforcer.cache().invalidate(user).await.unwrap();
    let revoked = enforcer
        .require_one(user, "content:editorial:posts:posts:create")
        .await
        .unwrap_err();
    assert_eq!(revoked.kind(), ErrorKind::Forbidden);
}
