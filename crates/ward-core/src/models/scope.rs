//! Scope domain model.
//!
//! Scopes are independent of the module tree and describe the breadth of
//! access (organization-wide down to personal).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WardError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    Organization,
    Department,
    Team,
    Personal,
}

impl ScopeLevel {
    pub const ALL: [ScopeLevel; 4] = [
        ScopeLevel::Organization,
        ScopeLevel::Department,
        ScopeLevel::Team,
        ScopeLevel::Personal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeLevel::Organization => "organization",
            ScopeLevel::Department => "department",
            ScopeLevel::Team => "team",
            ScopeLevel::Personal => "personal",
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeLevel {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(ScopeLevel::Organization),
            "department" => Ok(ScopeLevel::Department),
            "team" => Ok(ScopeLevel::Team),
            "personal" => Ok(ScopeLevel::Personal),
            other => Err(WardError::validation(format!("unknown scope level '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scope {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub level: ScopeLevel,
    /// Higher priority scopes sort first.
    pub priority: i64,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScope {
    pub code: String,
    pub name: String,
    pub level: ScopeLevel,
    pub priority: i64,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateScope {
    pub code: Option<String>,
    pub name: Option<String>,
    pub level: Option<ScopeLevel>,
    pub priority: Option<i64>,
}
