//! Read access shared by builders, sealed results and collections

use std::collections::{BTreeMap, BTreeSet};

use crate::account::Identifier;
use crate::cacheable::Cacheable;
use crate::item::{ItemKey, PermissionItem};

/// Items keyed by (scope, identifier) in deterministic order
pub type ItemMap = BTreeMap<ItemKey, PermissionItem>;

/// Query interface over a calculated set of permission items
pub trait CalculatedPermissions: Cacheable {
    fn item_map(&self) -> &ItemMap;

    fn item(&self, scope: &str, identifier: &Identifier) -> Option<&PermissionItem> {
        self.item_map()
            .get(&ItemKey::new(scope, identifier.clone()))
    }

    fn items(&self) -> Box<dyn Iterator<Item = &PermissionItem> + '_> {
        Box::new(self.item_map().values())
    }

    fn items_by_scope<'a>(&'a self, scope: &'a str) -> Box<dyn Iterator<Item = &'a PermissionItem> + 'a> {
        Box::new(self.item_map().values().filter(move |item| item.scope() == scope))
    }

    fn scopes(&self) -> BTreeSet<&str> {
        self.item_map().keys().map(|key| key.scope.as_str()).collect()
    }

    /// True when the item for (scope, identifier) exists and grants `permission`
    fn has_permission(&self, scope: &str, identifier: &Identifier, permission: &str) -> bool {
        self.item(scope, identifier)
            .is_some_and(|item| item.has_permission(permission))
    }

    fn len(&self) -> usize {
        self.item_map().len()
    }

    fn is_empty(&self) -> bool {
        self.item_map().is_empty()
    }
}

/// Merge-on-insert: an existing item under the same key is unioned, never replaced
pub(crate) fn merge_item_into(items: &mut ItemMap, item: PermissionItem) {
    use std::collections::btree_map::Entry;

    match items.entry(item.key()) {
        Entry::Occupied(mut existing) => {
            let merged = existing.get().union(&item);
            existing.insert(merged);
        }
        Entry::Vacant(slot) => {
            slot.insert(item);
        }
    }
}
