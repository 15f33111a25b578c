//! Permission calculators backed by a group store

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};
use warden_chain::{CalculatorError, PermissionCalculator, USER_CONTEXT, USER_ROLES_CONTEXT};
use warden_core::{scope, Account, PermissionItem, PermissionsBuilder, RefinableCacheable};

use crate::models::{GroupRole, RoleScope};
use crate::store::{group_tag, membership_list_tag, role_tag, GroupStore, ROLE_LIST_TAG};

/// Union of the roles' permissions, and whether any of them is an admin role
fn combine<'a>(roles: impl IntoIterator<Item = &'a GroupRole>) -> (BTreeSet<String>, bool) {
    let mut permissions = BTreeSet::new();
    let mut admin = false;
    for role in roles {
        permissions.extend(role.permissions.iter().cloned());
        admin |= role.admin;
    }
    (permissions, admin)
}

/// Permissions from the roles an account holds in the groups it belongs to
pub struct IndividualGroupPermissionCalculator {
    store: Arc<dyn GroupStore>,
}

impl IndividualGroupPermissionCalculator {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }
}

impl PermissionCalculator for IndividualGroupPermissionCalculator {
    fn name(&self) -> &str {
        "individual_group"
    }

    fn applies_to(&self, scope: &str) -> bool {
        scope == scope::INDIVIDUAL
    }

    fn calculate(&self, account: &Account, scope: &str) -> Result<PermissionsBuilder, CalculatorError> {
        let mut builder = PermissionsBuilder::new();
        if scope != scope::INDIVIDUAL {
            return Ok(builder);
        }

        builder.add_cache_tags([membership_list_tag(account.id)]);

        for membership in self.store.memberships_for(account.id) {
            let mut roles = Vec::new();
            for role_id in &membership.roles {
                match self.store.role(role_id) {
                    Some(role) if role.scope == RoleScope::Individual => roles.push(role),
                    Some(_) => debug!("Skipping synchronized role '{}' assigned individually", role_id),
                    None => warn!("Membership of group {} references missing role '{}'", membership.group_id, role_id),
                }
            }

            let (permissions, admin) = combine(&roles);
            builder.add_cache_tags([group_tag(membership.group_id)]);
            builder.add_cache_tags(roles.iter().map(|role| role_tag(&role.id)));
            builder.add_item(PermissionItem::new(scope, membership.group_id, permissions, admin));
        }

        Ok(builder)
    }

    fn persistent_cache_contexts(&self, _scope: &str) -> BTreeSet<String> {
        BTreeSet::from([USER_CONTEXT.to_string()])
    }
}

/// Permissions synchronized from the account's global roles, per group type
pub struct SynchronizedGroupPermissionCalculator {
    store: Arc<dyn GroupStore>,
}

impl SynchronizedGroupPermissionCalculator {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }
}

impl PermissionCalculator for SynchronizedGroupPermissionCalculator {
    fn name(&self) -> &str {
        "synchronized_group"
    }

    fn applies_to(&self, scope: &str) -> bool {
        scope::is_synchronized(scope)
    }

    fn calculate(&self, account: &Account, scope: &str) -> Result<PermissionsBuilder, CalculatorError> {
        let mut builder = PermissionsBuilder::new();
        let role_scope = match scope {
            scope::INSIDER => RoleScope::Insider,
            scope::OUTSIDER => RoleScope::Outsider,
            _ => return Ok(builder),
        };

        builder.add_cache_tags([ROLE_LIST_TAG]);

        for group_type in self.store.group_types() {
            let roles: Vec<GroupRole> = self
                .store
                .roles_for_type(&group_type.id)
                .into_iter()
                .filter(|role| role.syncs_to(role_scope, &account.roles))
                .collect();
            if roles.is_empty() {
                continue;
            }

            let (permissions, admin) = combine(&roles);
            builder.add_cache_tags(roles.iter().map(|role| role_tag(&role.id)));
            builder.add_item(PermissionItem::new(scope, group_type.id.as_str(), permissions, admin));
        }

        Ok(builder)
    }

    fn persistent_cache_contexts(&self, _scope: &str) -> BTreeSet<String> {
        BTreeSet::from([USER_ROLES_CONTEXT.to_string()])
    }
}

/// Renames permissions contributed by other calculators
///
/// Contributes nothing itself; in the alter pass every aliased permission is
/// replaced by the name it stands for.
pub struct PermissionAliasCalculator {
    aliases: BTreeMap<String, String>,
}

impl PermissionAliasCalculator {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }
}

impl PermissionCalculator for PermissionAliasCalculator {
    fn name(&self) -> &str {
        "permission_alias"
    }

    fn calculate(&self, _account: &Account, _scope: &str) -> Result<PermissionsBuilder, CalculatorError> {
        Ok(PermissionsBuilder::new())
    }

    fn alter(&self, builder: &mut PermissionsBuilder) {
        for item in builder.snapshot() {
            if !item.permissions().iter().any(|permission| self.aliases.contains_key(permission)) {
                continue;
            }

            let renamed: BTreeSet<String> = item
                .permissions()
                .iter()
                .map(|permission| self.aliases.get(permission).unwrap_or(permission).clone())
                .collect();
            builder.replace_item(item.with_permissions(renamed));
        }
    }
}
