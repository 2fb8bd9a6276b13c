//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    ward_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "module",
        "department",
        "service",
        "scope",
        "role",
        "permission",
        "role_permission",
        "user_role",
        "user_permission",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    assert_eq!(ward_db::run_migrations(&db).await.unwrap(), 1);
    assert_eq!(ward_db::run_migrations(&db).await.unwrap(), 0);

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_permission_keys() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    ward_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE permission SET \
                  module = 'content', department = 'editorial', \
                  service = 'posts', resource = 'posts', action = 'create', \
                  perm_key = 'content:editorial:posts:posts:create'";

    db.query(insert).await.unwrap().check().unwrap();

    let second = db.query(insert).await.unwrap().check();
    assert!(second.is_err(), "duplicate perm_key should be rejected");
}

#[tokio::test]
async fn scope_level_is_constrained() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    ward_db::run_migrations(&db).await.unwrap();

    let result = db
        .query("CREATE scope SET code = 'galaxy', name = 'Galaxy', level = 'galaxy'")
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "unknown scope level should be rejected");
}
