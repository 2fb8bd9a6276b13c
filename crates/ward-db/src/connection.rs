//! Connection to the SurrealDB instance holding the Ward catalog.

use std::fmt;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Where the hierarchy, roles, permissions and grants are stored.
///
/// Ward signs in with root credentials because `run_migrations` defines
/// tables and indexes. `ward-server` fills this from the `WARD_DB_*`
/// variables; the defaults match a local `surreal start`.
#[derive(Clone)]
pub struct DbConfig {
    /// WebSocket endpoint without scheme, e.g. `127.0.0.1:8000`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "ward".into(),
            database: "authz".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

// Configuration gets logged at startup; the password must not be.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Shared handle to the Ward database. Clones share one connection.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the WebSocket connection, sign in and select
    /// `namespace`/`database`. Failures name the step and the endpoint.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let step = |what: &str, err: surrealdb::Error| {
            DbError::Connection(format!("{what} {}: {err}", config.url))
        };

        let db = Surreal::new::<Ws>(&config.url)
            .await
            .map_err(|e| step("connect to", e))?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await
        .map_err(|e| step("sign in at", e))?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| step("select namespace/database at", e))?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connected to Ward database"
        );
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
