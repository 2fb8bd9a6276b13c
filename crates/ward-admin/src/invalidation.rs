//! Cache invalidation after grant mutations.

use tracing::warn;
use uuid::Uuid;
use ward_authz::PermissionCache;

/// Drop the cached permission sets of `users`.
///
/// The mutation has already been committed when this runs, so a failure
/// is logged rather than returned; the stale entry ages out with its TTL.
pub(crate) async fn invalidate_users<C: PermissionCache>(
    cache: &C,
    users: &[Uuid],
    operation: &str,
) {
    for user_id in users {
        if let Err(e) = cache.invalidate(*user_id).await {
            warn!(
                %user_id,
                operation,
                error = %e,
                "Permission cache invalidation failed"
            );
        }
    }
}
