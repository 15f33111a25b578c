//! Data models for groups, roles and memberships

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use warden_core::{scope, AccountId};

/// Kind of group, such as a club or a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupType {
    pub id: String,
    pub label: String,
}

impl GroupType {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub group_type: String,
    #[serde(default)]
    pub label: String,
}

impl Group {
    pub fn new(id: i64, group_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            group_type: group_type.into(),
            label: label.into(),
        }
    }
}

/// How a role reaches an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    /// Assigned to members one by one
    Individual,
    /// Granted to members holding the role's global role
    Insider,
    /// Granted to non-members holding the role's global role
    Outsider,
}

impl RoleScope {
    /// Permission scope the role's permissions are calculated in
    pub fn as_scope(&self) -> &'static str {
        match self {
            RoleScope::Individual => scope::INDIVIDUAL,
            RoleScope::Insider => scope::INSIDER,
            RoleScope::Outsider => scope::OUTSIDER,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        !matches!(self, RoleScope::Individual)
    }
}

/// Role defined for one group type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRole {
    pub id: String,
    pub group_type: String,
    pub scope: RoleScope,
    /// Global role a synchronized role follows
    #[serde(default)]
    pub global_role: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl GroupRole {
    pub fn individual<I, S>(id: impl Into<String>, group_type: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            group_type: group_type.into(),
            scope: RoleScope::Individual,
            global_role: None,
            admin: false,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Role synchronized to `global_role` in `scope`
    pub fn synchronized<I, S>(
        id: impl Into<String>,
        group_type: impl Into<String>,
        scope: RoleScope,
        global_role: impl Into<String>,
        permissions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            group_type: group_type.into(),
            scope,
            global_role: Some(global_role.into()),
            admin: false,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    /// Whether an account holding `global_roles` receives this role in `scope`
    pub fn syncs_to(&self, scope: RoleScope, global_roles: &BTreeSet<String>) -> bool {
        self.scope == scope
            && self
                .global_role
                .as_ref()
                .is_some_and(|role| global_roles.contains(role))
    }
}

/// An account's membership of a group and its individual roles there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: i64,
    pub account_id: AccountId,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Membership {
    pub fn new<I, S>(group_id: i64, account_id: impl Into<AccountId>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_id,
            account_id: account_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_scope_maps_to_permission_scope() {
        assert_eq!(RoleScope::Individual.as_scope(), "individual");
        assert_eq!(RoleScope::Outsider.as_scope(), "outsider");
        assert!(RoleScope::Insider.is_synchronized());
        assert!(!RoleScope::Individual.is_synchronized());
    }

    #[test]
    fn test_syncs_to() {
        let role = GroupRole::synchronized("club-outsider", "club", RoleScope::Outsider, "authenticated", ["view group"]);
        let roles: BTreeSet<String> = ["authenticated".to_string()].into();

        assert!(role.syncs_to(RoleScope::Outsider, &roles));
        assert!(!role.syncs_to(RoleScope::Insider, &roles));
        assert!(!role.syncs_to(RoleScope::Outsider, &BTreeSet::new()));
    }
}
