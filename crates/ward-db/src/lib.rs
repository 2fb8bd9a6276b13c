//! Ward Database — SurrealDB connection management, schema migrations,
//! repository implementations and the system seed catalog.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Implementations of the `ward-core` repository traits ([`repository`])
//! - Seeding of system-protected rows ([`seed_system_catalog`])

mod connection;
mod error;
pub mod repository;
mod schema;
mod seed;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
pub use seed::{
    SUPER_ADMIN_ROLE, SYSTEM_DEPARTMENT, SYSTEM_MODULE, SYSTEM_SERVICE, SeedReport,
    seed_system_catalog,
};
