//! Permission string codec.
//!
//! A permission is the 5-tuple `module:department:service:resource:action`.
//! The joined string is the unit every enforcement call site and the
//! cache compare for equality. No escaping is performed, so segments must
//! never contain the separator; that is checked when permissions are
//! created, not here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{WardError, WardResult};

pub const SEPARATOR: char = ':';
const SEGMENT_COUNT: usize = 5;

/// Join the five segments with `:`.
pub fn encode(
    module: &str,
    department: &str,
    service: &str,
    resource: &str,
    action: &str,
) -> String {
    [module, department, service, resource, action].join(":")
}

/// Split a permission string into its five segments.
///
/// Fails unless there are exactly five non-empty segments. There is no
/// partial output on failure.
pub fn decode(raw: &str) -> WardResult<(String, String, String, String, String)> {
    let parts: Vec<&str> = raw.split(SEPARATOR).collect();
    if parts.len() != SEGMENT_COUNT {
        return Err(WardError::validation(format!(
            "permission '{raw}' must have {SEGMENT_COUNT} segments, found {}",
            parts.len()
        )));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(WardError::validation(format!(
            "permission '{raw}' contains an empty segment"
        )));
    }
    Ok((
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
        parts[3].to_string(),
        parts[4].to_string(),
    ))
}

/// Check a single segment before it is stored: non-empty, trimmed, and
/// free of the separator.
pub fn validate_segment(field: &str, value: &str) -> WardResult<()> {
    if value.trim().is_empty() {
        return Err(WardError::validation(format!("{field} must not be empty")));
    }
    if value.contains(SEPARATOR) {
        return Err(WardError::validation(format!(
            "{field} must not contain '{SEPARATOR}'"
        )));
    }
    if value.trim() != value {
        return Err(WardError::validation(format!(
            "{field} must not have leading or trailing whitespace"
        )));
    }
    Ok(())
}

/// A validated permission string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Build a key from segments, validating each one.
    pub fn from_parts(
        module: &str,
        department: &str,
        service: &str,
        resource: &str,
        action: &str,
    ) -> WardResult<Self> {
        validate_segment("module", module)?;
        validate_segment("department", department)?;
        validate_segment("service", service)?;
        validate_segment("resource", resource)?;
        validate_segment("action", action)?;
        Ok(Self(encode(module, department, service, resource, action)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segment(&self, index: usize) -> &str {
        // Construction guarantees five segments.
        self.0.split(SEPARATOR).nth(index).unwrap_or_default()
    }

    pub fn module(&self) -> &str {
        self.segment(0)
    }

    pub fn department(&self) -> &str {
        self.segment(1)
    }

    pub fn service(&self) -> &str {
        self.segment(2)
    }

    pub fn resource(&self) -> &str {
        self.segment(3)
    }

    pub fn action(&self) -> &str {
        self.segment(4)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for PermissionKey {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (m, d, sv, r, a) = decode(s)?;
        Self::from_parts(&m, &d, &sv, &r, &a)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = WardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.0
    }
}

impl AsRef<str> for PermissionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_inverts_encode() {
        let cases = [
            ("content", "editorial", "posts", "posts", "create"),
            ("admin", "system", "users", "users", "read"),
            ("a", "b", "c", "d", "e"),
            ("billing-v2", "finance.eu", "invoices", "line_items", "export"),
        ];
        for (m, d, s, r, a) in cases {
            let encoded = encode(m, d, s, r, a);
            let decoded = decode(&encoded).unwrap();
            assert_eq!(
                decoded,
                (m.into(), d.into(), s.into(), r.into(), a.into()),
                "round trip failed for {encoded}"
            );
        }
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        for raw in ["", "a", "a:b:c:d", "a:b:c:d:e:f", "a:b:c:d:e:"] {
            assert!(decode(raw).is_err(), "'{raw}' should not decode");
        }
    }

    #[test]
    fn decode_rejects_empty_segment() {
        let err = decode("content::posts:posts:create").unwrap_err();
        assert!(matches!(err, WardError::Validation { .. }));
        assert!(decode(":b:c:d:e").is_err());
    }

    #[test]
    fn key_accessors() {
        let key: PermissionKey = "content:editorial:posts:drafts:publish".parse().unwrap();
        assert_eq!(key.module(), "content");
        assert_eq!(key.department(), "editorial");
        assert_eq!(key.service(), "posts");
        assert_eq!(key.resource(), "drafts");
        assert_eq!(key.action(), "publish");
        assert_eq!(key.to_string(), "content:editorial:posts:drafts:publish");
    }

    #[test]
    fn from_parts_rejects_separator_in_segment() {
        let err = PermissionKey::from_parts("content", "edit:orial", "posts", "posts", "create")
            .unwrap_err();
        assert!(err.to_string().contains("department"));
    }

    #[test]
    fn from_parts_rejects_padded_segment() {
        assert!(PermissionKey::from_parts(" content", "e", "p", "p", "c").is_err());
    }

    #[test]
    fn serde_is_transparent_and_validating() {
        let key: PermissionKey = serde_json::from_str("\"a:b:c:d:e\"").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"a:b:c:d:e\"");
        assert!(serde_json::from_str::<PermissionKey>("\"a:b\"").is_err());
    }
}
