//! Database-specific error types and conversions.

use ward_core::error::WardError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query on {entity} failed: {detail}")]
    Query { entity: String, detail: String },

    #[error("Duplicate {entity}: {detail}")]
    Duplicate { entity: String, detail: String },

    #[error("Corrupt {entity} row: {detail}")]
    Corrupt { entity: String, detail: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a failed statement. Unique index violations surface as
    /// [`DbError::Duplicate`] so the admin layer reports a conflict
    /// instead of a storage failure.
    pub(crate) fn statement(entity: &str, err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        if detail.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query {
                entity: entity.into(),
                detail,
            }
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for WardError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WardError::NotFound { entity, id },
            DbError::Duplicate { entity, detail } => WardError::Conflict {
                entity,
                reason: detail,
            },
            other => WardError::Database(other.to_string()),
        }
    }
}
