//! Role domain model.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: Uuid,
    /// Unique role name (e.g., `editor`).
    pub name: String,
    pub display_name: String,
    pub level: i64,
    pub parent_id: Option<Uuid>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub display_name: String,
    pub level: i64,
    pub parent_id: Option<Uuid>,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub level: Option<i64>,
    /// `Some(Some(id))` = reparent, `Some(None)` = make root, `None` = no change.
    pub parent_id: Option<Option<Uuid>>,
}

/// A role with its children, as rebuilt from the flat adjacency list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleNode {
    pub role: Role,
    pub children: Vec<RoleNode>,
}

/// Rebuild the role forest from a flat list linked by `parent_id`.
///
/// Roles whose parent is missing from the input are treated as roots.
/// Siblings keep the order they had in the input. The store only rejects
/// direct self-parenting, so roles caught in a longer parent cycle are
/// unreachable from any root and are left out.
pub fn build_role_tree(roles: Vec<Role>) -> Vec<RoleNode> {
    let known: HashSet<Uuid> = roles.iter().map(|r| r.id).collect();
    let mut children: HashMap<Option<Uuid>, Vec<Role>> = HashMap::new();
    for role in roles {
        let parent = role.parent_id.filter(|p| known.contains(p) && *p != role.id);
        children.entry(parent).or_default().push(role);
    }

    let mut placed = HashSet::new();
    fn attach(
        parent: Option<Uuid>,
        children: &mut HashMap<Option<Uuid>, Vec<Role>>,
        placed: &mut HashSet<Uuid>,
    ) -> Vec<RoleNode> {
        let Some(level) = children.remove(&parent) else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(level.len());
        for role in level {
            if !placed.insert(role.id) {
                continue;
            }
            let id = role.id;
            nodes.push(RoleNode {
                role,
                children: attach(Some(id), children, placed),
            });
        }
        nodes
    }

    attach(None, &mut children, &mut placed)
}
