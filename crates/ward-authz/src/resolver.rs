//! Permission resolver.

use std::collections::HashSet;

use tracing::instrument;
use uuid::Uuid;
use ward_core::error::WardResult;
use ward_core::repository::PermissionSource;

/// Computes a user's effective permission set from the source of truth.
///
/// No caching happens here; every call reaches the underlying
/// [`PermissionSource`]. A user with no grants resolves to an empty set.
pub struct PermissionResolver<S> {
    source: S,
}

impl<S: PermissionSource> PermissionResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn resolve(&self, user_id: Uuid) -> WardResult<HashSet<String>> {
        self.source.effective_permissions(user_id).await
    }
}

impl<S: PermissionSource> PermissionSource for PermissionResolver<S> {
    async fn effective_permissions(&self, user_id: Uuid) -> WardResult<HashSet<String>> {
        self.resolve(user_id).await
    }
}
