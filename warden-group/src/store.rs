//! Group storage

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use warden_core::AccountId;

use crate::error::{GroupError, GroupResult};
use crate::models::{Group, GroupRole, GroupType, Membership, RoleScope};
use crate::validation::RoleAssignmentValidator;

/// Cache tag of everything derived from a group
pub fn group_tag(group_id: i64) -> String {
    format!("group:{}", group_id)
}

/// Cache tag of everything derived from a role
pub fn role_tag(role_id: &str) -> String {
    format!("group_role:{}", role_id)
}

/// Cache tag of an account's membership list
pub fn membership_list_tag(account_id: AccountId) -> String {
    format!("group_membership_list:{}", account_id)
}

/// Cache tag covering the set of synchronized roles
pub const ROLE_LIST_TAG: &str = "group_role_list";

/// Read access to groups, roles and memberships
pub trait GroupStore: Send + Sync {
    fn group(&self, group_id: i64) -> Option<Group>;

    fn group_types(&self) -> Vec<GroupType>;

    fn role(&self, role_id: &str) -> Option<GroupRole>;

    fn roles_for_type(&self, group_type: &str) -> Vec<GroupRole>;

    fn membership(&self, group_id: i64, account_id: AccountId) -> Option<Membership>;

    fn memberships_for(&self, account_id: AccountId) -> Vec<Membership>;

    /// Number of memberships the role is individually assigned in
    fn role_assignment_count(&self, role_id: &str) -> usize;
}

#[derive(Debug, Default)]
struct Inner {
    group_types: BTreeMap<String, GroupType>,
    groups: BTreeMap<i64, Group>,
    roles: BTreeMap<String, GroupRole>,
    memberships: BTreeMap<(i64, AccountId), Membership>,
}

/// Serialisable snapshot of a store's contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFixture {
    #[serde(default)]
    pub group_types: Vec<GroupType>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub roles: Vec<GroupRole>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

/// In-memory group store.
///
/// Mutations return the cache tags a caller must invalidate on the
/// permission chain for the change to become visible.
#[derive(Debug, Default)]
pub struct InMemoryGroupStore {
    inner: RwLock<Inner>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture, validating it the same way individual mutations are
    pub fn from_fixture(fixture: GroupFixture) -> GroupResult<Self> {
        let store = Self::new();
        for group_type in fixture.group_types {
            store.add_group_type(group_type);
        }
        for group in fixture.groups {
            store.add_group(group)?;
        }
        for role in fixture.roles {
            store.save_role(role)?;
        }
        for membership in fixture.memberships {
            store.add_membership(membership)?;
        }
        Ok(store)
    }

    pub fn add_group_type(&self, group_type: GroupType) -> Vec<String> {
        self.inner
            .write()
            .group_types
            .insert(group_type.id.clone(), group_type);
        vec![ROLE_LIST_TAG.to_string()]
    }

    pub fn add_group(&self, group: Group) -> GroupResult<Vec<String>> {
        let mut inner = self.inner.write();
        if !inner.group_types.contains_key(&group.group_type) {
            return Err(GroupError::GroupTypeNotFound {
                group_type: group.group_type,
            });
        }

        let tags = vec![group_tag(group.id)];
        inner.groups.insert(group.id, group);
        Ok(tags)
    }

    /// Create or update a role
    pub fn save_role(&self, role: GroupRole) -> GroupResult<Vec<String>> {
        if !self.inner.read().group_types.contains_key(&role.group_type) {
            return Err(GroupError::GroupTypeNotFound {
                group_type: role.group_type,
            });
        }
        if role.scope.is_synchronized() && role.global_role.is_none() {
            return Err(GroupError::invalid_config(format!(
                "synchronized role '{}' needs a global role",
                role.id
            )));
        }

        let violations = RoleAssignmentValidator::new(self).validate_role_change(&role);
        if !violations.is_empty() {
            return Err(GroupError::InvalidAssignment { violations });
        }

        let mut inner = self.inner.write();
        let was_synchronized = inner
            .roles
            .get(&role.id)
            .is_some_and(|previous| previous.scope.is_synchronized());

        let mut tags = vec![role_tag(&role.id)];
        if was_synchronized || role.scope.is_synchronized() {
            tags.push(ROLE_LIST_TAG.to_string());
        }

        debug!("Saving group role '{}'", role.id);
        inner.roles.insert(role.id.clone(), role);
        Ok(tags)
    }

    /// Add or replace a membership
    pub fn add_membership(&self, membership: Membership) -> GroupResult<Vec<String>> {
        let group = self.group(membership.group_id).ok_or(GroupError::GroupNotFound {
            group_id: membership.group_id,
        })?;

        let violations = RoleAssignmentValidator::new(self).validate_assignment(&group, &membership.roles);
        if !violations.is_empty() {
            return Err(GroupError::InvalidAssignment { violations });
        }

        let tags = vec![group_tag(group.id), membership_list_tag(membership.account_id)];
        self.inner
            .write()
            .memberships
            .insert((membership.group_id, membership.account_id), membership);
        Ok(tags)
    }

    pub fn remove_membership(&self, group_id: i64, account_id: AccountId) -> Vec<String> {
        match self.inner.write().memberships.remove(&(group_id, account_id)) {
            Some(_) => vec![group_tag(group_id), membership_list_tag(account_id)],
            None => Vec::new(),
        }
    }

    /// Synchronized roles of every group type for `scope`
    pub fn synchronized_roles(&self, scope: RoleScope) -> Vec<GroupRole> {
        self.inner
            .read()
            .roles
            .values()
            .filter(|role| role.scope == scope)
            .cloned()
            .collect()
    }
}

impl GroupStore for InMemoryGroupStore {
    fn group(&self, group_id: i64) -> Option<Group> {
        self.inner.read().groups.get(&group_id).cloned()
    }

    fn group_types(&self) -> Vec<GroupType> {
        self.inner.read().group_types.values().cloned().collect()
    }

    fn role(&self, role_id: &str) -> Option<GroupRole> {
        self.inner.read().roles.get(role_id).cloned()
    }

    fn roles_for_type(&self, group_type: &str) -> Vec<GroupRole> {
        self.inner
            .read()
            .roles
            .values()
            .filter(|role| role.group_type == group_type)
            .cloned()
            .collect()
    }

    fn membership(&self, group_id: i64, account_id: AccountId) -> Option<Membership> {
        self.inner
            .read()
            .memberships
            .get(&(group_id, account_id))
            .cloned()
    }

    fn memberships_for(&self, account_id: AccountId) -> Vec<Membership> {
        self.inner
            .read()
            .memberships
            .values()
            .filter(|membership| membership.account_id == account_id)
            .cloned()
            .collect()
    }

    fn role_assignment_count(&self, role_id: &str) -> usize {
        self.inner
            .read()
            .memberships
            .values()
            .filter(|membership| membership.roles.contains(role_id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club_store() -> InMemoryGroupStore {
        let store = InMemoryGroupStore::new();
        store.add_group_type(GroupType::new("club", "Club"));
        store.add_group(Group::new(1, "club", "Chess club")).unwrap();
        store
            .save_role(GroupRole::individual("club-member", "club", ["view group"]))
            .unwrap();
        store
    }

    #[test]
    fn test_add_group_requires_type() {
        let store = InMemoryGroupStore::new();
        let err = store.add_group(Group::new(1, "club", "Chess club")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_membership_tags() {
        let store = club_store();
        let tags = store
            .add_membership(Membership::new(1, 5, ["club-member"]))
            .unwrap();
        assert_eq!(tags, vec!["group:1".to_string(), "group_membership_list:5".to_string()]);

        assert_eq!(store.memberships_for(AccountId(5)).len(), 1);
        assert_eq!(store.role_assignment_count("club-member"), 1);

        assert_eq!(store.remove_membership(1, AccountId(5)).len(), 2);
        assert!(store.remove_membership(1, AccountId(5)).is_empty());
    }

    #[test]
    fn test_invalid_membership_is_rejected() {
        let store = club_store();
        let err = store
            .add_membership(Membership::new(1, 5, ["nope"]))
            .unwrap_err();
        assert!(matches!(err, GroupError::InvalidAssignment { ref violations } if violations.len() == 1));
        assert!(store.membership(1, AccountId(5)).is_none());

        let err = store
            .add_membership(Membership::new(9, 5, ["club-member"]))
            .unwrap_err();
        assert!(matches!(err, GroupError::GroupNotFound { group_id: 9 }));
    }

    #[test]
    fn test_synchronized_role_tags() {
        let store = club_store();
        let tags = store
            .save_role(GroupRole::synchronized(
                "club-outsider",
                "club",
                RoleScope::Outsider,
                "authenticated",
                ["view group"],
            ))
            .unwrap();
        assert!(tags.contains(&ROLE_LIST_TAG.to_string()));
        assert_eq!(store.synchronized_roles(RoleScope::Outsider).len(), 1);
    }

    #[test]
    fn test_synchronized_role_requires_global_role() {
        let store = club_store();
        let mut role = GroupRole::individual("club-insider", "club", ["view group"]);
        role.scope = RoleScope::Insider;
        assert!(matches!(store.save_role(role), Err(GroupError::InvalidConfig { .. })));
    }

    #[test]
    fn test_fixture_from_yaml() {
        let yaml = r#"
group_types:
  - { id: club, label: Club }
groups:
  - { id: 1, group_type: club, label: Chess club }
roles:
  - { id: club-member, group_type: club, scope: individual, permissions: [view group] }
  - { id: club-outsider, group_type: club, scope: outsider, global_role: authenticated, permissions: [view group] }
memberships:
  - { group_id: 1, account_id: 5, roles: [club-member] }
"#;
        let fixture: GroupFixture = serde_yaml::from_str(yaml).unwrap();
        let store = InMemoryGroupStore::from_fixture(fixture).unwrap();

        assert_eq!(store.group_types().len(), 1);
        assert_eq!(store.roles_for_type("club").len(), 2);
        assert!(store.membership(1, AccountId(5)).is_some());
    }
}
