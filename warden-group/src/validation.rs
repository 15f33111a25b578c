//! Role assignment validation
//!
//! Violations are collected rather than returned one at a time so a caller
//! can show every problem with an assignment at once.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Group, GroupRole, RoleScope};
use crate::store::GroupStore;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleViolation {
    #[error("Role '{role_id}' does not exist")]
    UnknownRole { role_id: String },

    #[error("Role '{role_id}' belongs to group type '{role_group_type}' and cannot be used in a group of type '{group_type}'")]
    WrongGroupType {
        role_id: String,
        role_group_type: String,
        group_type: String,
    },

    #[error("Role '{role_id}' is synchronized for {scope} members and cannot be assigned to an individual member")]
    SynchronizedRoleAssigned { role_id: String, scope: String },

    #[error("Role '{role_id}' cannot become synchronized while it is assigned to {assignments} member(s)")]
    SynchronizedWhileAssigned { role_id: String, assignments: usize },
}

/// Checks role assignments and role changes against a store
pub struct RoleAssignmentValidator<'a, S: GroupStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GroupStore + ?Sized> RoleAssignmentValidator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Violations of assigning `role_ids` to a member of `group`
    pub fn validate_assignment<I, R>(&self, group: &Group, role_ids: I) -> Vec<RoleViolation>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        let mut violations = Vec::new();

        for role_id in role_ids {
            let role_id = role_id.as_ref();
            let Some(role) = self.store.role(role_id) else {
                violations.push(RoleViolation::UnknownRole {
                    role_id: role_id.to_string(),
                });
                continue;
            };

            if role.group_type != group.group_type {
                violations.push(RoleViolation::WrongGroupType {
                    role_id: role.id.clone(),
                    role_group_type: role.group_type.clone(),
                    group_type: group.group_type.clone(),
                });
            }

            if role.scope.is_synchronized() {
                violations.push(RoleViolation::SynchronizedRoleAssigned {
                    role_id: role.id.clone(),
                    scope: role.scope.as_scope().to_string(),
                });
            }
        }

        violations
    }

    /// Violations of saving `role` over its stored version
    pub fn validate_role_change(&self, role: &GroupRole) -> Vec<RoleViolation> {
        if role.scope == RoleScope::Individual {
            return Vec::new();
        }

        let assignments = self.store.role_assignment_count(&role.id);
        if assignments > 0 {
            vec![RoleViolation::SynchronizedWhileAssigned {
                role_id: role.id.clone(),
                assignments,
            }]
        } else {
            Vec::new()
        }
    }
}
