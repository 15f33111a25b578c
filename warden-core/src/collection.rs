//! Immutable calculated permissions

use serde::{Deserialize, Serialize};

use crate::cacheable::{CacheMetadata, Cacheable, Mergeable};
use crate::calculated::{merge_item_into, CalculatedPermissions, ItemMap};
use crate::item::PermissionItem;

/// Frozen result of a permission calculation for one account and context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CollectionRepr", into = "CollectionRepr")]
pub struct PermissionsCollection {
    items: ItemMap,
    cache: CacheMetadata,
}

/// Wire form: items as a list since (scope, identifier) keys are not strings
#[derive(Serialize, Deserialize)]
struct CollectionRepr {
    items: Vec<PermissionItem>,
    #[serde(default)]
    cache: CacheMetadata,
}

impl From<CollectionRepr> for PermissionsCollection {
    fn from(repr: CollectionRepr) -> Self {
        let mut items = ItemMap::new();
        for item in repr.items {
            merge_item_into(&mut items, item);
        }
        Self {
            items,
            cache: repr.cache,
        }
    }
}

impl From<PermissionsCollection> for CollectionRepr {
    fn from(collection: PermissionsCollection) -> Self {
        Self {
            items: collection.items.into_values().collect(),
            cache: collection.cache,
        }
    }
}

impl PermissionsCollection {
    pub(crate) fn from_parts(items: ItemMap, cache: CacheMetadata) -> Self {
        Self { items, cache }
    }

    /// Collection with no items and no cacheability
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_items(self) -> Vec<PermissionItem> {
        self.items.into_values().collect()
    }
}

impl Cacheable for PermissionsCollection {
    fn cache_metadata(&self) -> &CacheMetadata {
        &self.cache
    }
}

impl CalculatedPermissions for PermissionsCollection {
    fn item_map(&self) -> &ItemMap {
        &self.items
    }
}

impl Mergeable for PermissionsCollection {
    /// Items present in both operands are merged, the rest copied
    fn merge(&self, other: &Self) -> Self {
        let mut items = self.items.clone();
        for item in other.items.values() {
            merge_item_into(&mut items, item.clone());
        }

        Self {
            items,
            cache: self.cache.merge(&other.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Identifier;
    use crate::builder::PermissionsBuilder;
    use crate::cacheable::{RefinableCacheable, PERMANENT};

    fn collection(items: Vec<PermissionItem>, tag: &str, max_age: i64) -> PermissionsCollection {
        let mut builder = PermissionsBuilder::new();
        for item in items {
            builder.add_item(item);
        }
        builder.add_cache_tags([tag]);
        builder.merge_cache_max_age(max_age);
        builder.seal().freeze()
    }

    #[test]
    fn test_merge_collections() {
        let a = collection(
            vec![
                PermissionItem::new("individual", 1, ["view group"], false),
                PermissionItem::new("insider", "club", ["view group"], false),
            ],
            "a",
            PERMANENT,
        );
        let b = collection(
            vec![
                PermissionItem::new("individual", 1, ["edit group"], false),
                PermissionItem::new("outsider", "club", ["view group"], false),
            ],
            "b",
            300,
        );

        let merged = a.merge(&b);
        assert_eq!(merged.len(), 3);
        let item = merged.item("individual", &Identifier::from(1)).unwrap();
        assert!(item.has_permission("view group"));
        assert!(item.has_permission("edit group"));
        assert_eq!(merged.cache_tags().len(), 2);
        assert_eq!(merged.cache_max_age(), 300);
    }

    #[test]
    fn test_has_permission() {
        let c = collection(
            vec![PermissionItem::admin("individual", 7)],
            "a",
            PERMANENT,
        );
        assert!(c.has_permission("individual", &Identifier::from(7), "delete group"));
        assert!(!c.has_permission("individual", &Identifier::from(8), "delete group"));
    }

    #[test]
    fn test_json_round_trip_keeps_equality() {
        let c = collection(
            vec![
                PermissionItem::new("individual", 1, ["view group"], false),
                PermissionItem::new("insider", "club", ["view group"], false),
            ],
            "group:1",
            PERMANENT,
        );

        let json = serde_json::to_string(&c).unwrap();
        let back: PermissionsCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
