//! Shared validation rules for admin use cases.

use ward_core::error::{WardError, WardResult};

pub(crate) fn require_non_empty(field: &str, value: &str) -> WardResult<()> {
    if value.trim().is_empty() {
        return Err(WardError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_if_set(field: &str, value: Option<&String>) -> WardResult<()> {
    match value {
        Some(value) => require_non_empty(field, value),
        None => Ok(()),
    }
}

/// System rows are immutable through the admin surface.
pub(crate) fn ensure_not_system(entity: &str, is_system: bool) -> WardResult<()> {
    if is_system {
        return Err(WardError::forbidden(format!(
            "{entity} is system-protected"
        )));
    }
    Ok(())
}

/// Turn a lookup by unique code into a uniqueness check: a hit is a
/// conflict, NotFound means the code is free.
pub(crate) fn ensure_free<T>(entity: &str, code: &str, lookup: WardResult<T>) -> WardResult<()> {
    match lookup {
        Ok(_) => Err(WardError::conflict(
            entity,
            format!("'{code}' is already taken"),
        )),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}
