//! A single scope's permissions for one subject

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::account::Identifier;
use crate::error::{CoreError, CoreResult};

/// Key items are stored under: unique per (scope, identifier)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub scope: String,
    pub identifier: Identifier,
}

impl ItemKey {
    pub fn new(scope: impl Into<String>, identifier: impl Into<Identifier>) -> Self {
        Self {
            scope: scope.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.identifier)
    }
}

/// Permissions one scope grants for one identifier
///
/// An admin item never carries explicit permissions: the list is dropped at
/// construction because admin already implies every permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ItemRepr")]
pub struct PermissionItem {
    scope: String,
    identifier: Identifier,
    permissions: BTreeSet<String>,
    is_admin: bool,
}

#[derive(Deserialize)]
struct ItemRepr {
    scope: String,
    identifier: Identifier,
    #[serde(default)]
    permissions: BTreeSet<String>,
    #[serde(default)]
    is_admin: bool,
}

impl From<ItemRepr> for PermissionItem {
    fn from(repr: ItemRepr) -> Self {
        PermissionItem::new(repr.scope, repr.identifier, repr.permissions, repr.is_admin)
    }
}

impl PermissionItem {
    pub fn new<P, S>(
        scope: impl Into<String>,
        identifier: impl Into<Identifier>,
        permissions: P,
        is_admin: bool,
    ) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions = if is_admin {
            BTreeSet::new()
        } else {
            permissions.into_iter().map(Into::into).collect()
        };

        Self {
            scope: scope.into(),
            identifier: identifier.into(),
            permissions,
            is_admin,
        }
    }

    /// Item granting everything within its scope and identifier
    pub fn admin(scope: impl Into<String>, identifier: impl Into<Identifier>) -> Self {
        Self::new(scope, identifier, Vec::<String>::new(), true)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.scope.clone(), self.identifier.clone())
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin || self.permissions.contains(permission)
    }

    /// Merge with an item sharing the same key
    pub fn merge(&self, other: &PermissionItem) -> CoreResult<PermissionItem> {
        if self.scope != other.scope || self.identifier != other.identifier {
            return Err(CoreError::ItemKeyMismatch {
                left: self.key().to_string(),
                right: other.key().to_string(),
            });
        }

        Ok(self.union(other))
    }

    /// Merge without checking keys; callers guarantee they match
    pub(crate) fn union(&self, other: &PermissionItem) -> PermissionItem {
        let is_admin = self.is_admin || other.is_admin;
        PermissionItem::new(
            self.scope.clone(),
            self.identifier.clone(),
            self.permissions.union(&other.permissions).cloned(),
            is_admin,
        )
    }

    /// Copy of this item with a different permission set
    pub fn with_permissions<P, S>(&self, permissions: P) -> PermissionItem
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PermissionItem::new(
            self.scope.clone(),
            self.identifier.clone(),
            permissions,
            self.is_admin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_drops_permissions() {
        let item = PermissionItem::new("individual", 1, ["view group", "edit group"], true);
        assert!(item.is_admin());
        assert!(item.permissions().is_empty());
        assert!(item.has_permission("anything at all"));
    }

    #[test]
    fn test_permissions_are_deduplicated() {
        let item = PermissionItem::new("individual", 1, ["view group", "view group"], false);
        assert_eq!(item.permissions().len(), 1);
        assert!(item.has_permission("view group"));
        assert!(!item.has_permission("edit group"));
    }

    #[test]
    fn test_merge_unions_and_admin_wins() {
        let a = PermissionItem::new("s", 1, ["bar"], false);
        let b = PermissionItem::new("s", 1, ["baz"], true);

        let merged = a.merge(&b).unwrap();
        assert!(merged.is_admin());
        assert!(merged.permissions().is_empty());

        let c = PermissionItem::new("s", 1, ["baz"], false);
        let merged = a.merge(&c).unwrap();
        assert_eq!(
            merged.permissions().iter().cloned().collect::<Vec<_>>(),
            vec!["bar".to_string(), "baz".to_string()]
        );
    }

    #[test]
    fn test_merge_rejects_different_keys() {
        let a = PermissionItem::new("s", 1, ["bar"], false);
        let b = PermissionItem::new("s", 2, ["bar"], false);
        let err = a.merge(&b).unwrap_err();
        assert!(err.is_key_mismatch());
        assert!(err.to_string().contains("s:1"));
        assert!(err.to_string().contains("s:2"));
    }

    #[test]
    fn test_deserialize_enforces_admin_invariant() {
        let item: PermissionItem = serde_json::from_str(
            r#"{"scope":"insider","identifier":"club","permissions":["view group"],"is_admin":true}"#,
        )
        .unwrap();
        assert!(item.permissions().is_empty());
        assert_eq!(item.identifier(), &Identifier::from("club"));
    }
}
