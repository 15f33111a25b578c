//! Single-group permission checks

use std::sync::Arc;
use tracing::debug;
use warden_chain::PermissionChain;
use warden_core::{scope, Account, CalculatedPermissions, Identifier};

use crate::error::{GroupError, GroupResult};
use crate::store::GroupStore;

/// Answers "may this account do X in that group"
pub struct GroupPermissionChecker {
    chain: Arc<PermissionChain>,
    store: Arc<dyn GroupStore>,
}

impl GroupPermissionChecker {
    pub fn new(chain: Arc<PermissionChain>, store: Arc<dyn GroupStore>) -> Self {
        Self { chain, store }
    }

    /// Members are checked against their individual item for the group and
    /// the insider item of its type; everyone else against the outsider item.
    pub async fn has_permission(&self, account: &Account, group_id: i64, permission: &str) -> GroupResult<bool> {
        let group = self
            .store
            .group(group_id)
            .ok_or(GroupError::GroupNotFound { group_id })?;

        let permissions = self.chain.resolve_scopes(account, &scope::ALL).await?;
        let group_type = Identifier::from(group.group_type.as_str());

        let granted = if self.store.membership(group_id, account.id).is_some() {
            permissions.has_permission(scope::INDIVIDUAL, &Identifier::Int(group_id), permission)
                || permissions.has_permission(scope::INSIDER, &group_type, permission)
        } else {
            permissions.has_permission(scope::OUTSIDER, &group_type, permission)
        };

        debug!(
            "Account {} {} '{}' in group {}",
            account.id,
            if granted { "has" } else { "lacks" },
            permission,
            group_id
        );
        Ok(granted)
    }
}
