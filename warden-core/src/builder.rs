//! Two-phase construction of calculated permissions
//!
//! Calculators add to a [`PermissionsBuilder`], which merges on insert so no
//! calculator can destroy a peer's contribution. Once every calculator ran the
//! builder is sealed into [`SealedPermissions`], where inserts overwrite and
//! removals take effect, and finally frozen into an immutable
//! [`PermissionsCollection`].

use crate::account::Identifier;
use crate::cacheable::{CacheMetadata, Cacheable, RefinableCacheable};
use crate::calculated::{merge_item_into, CalculatedPermissions, ItemMap};
use crate::collection::PermissionsCollection;
use crate::item::{ItemKey, PermissionItem};

/// Permissions still being accumulated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionsBuilder {
    items: ItemMap,
    cache: CacheMetadata,
}

impl PermissionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, merging with any item already stored under its key
    pub fn add_item(&mut self, item: PermissionItem) -> &mut Self {
        merge_item_into(&mut self.items, item);
        self
    }

    /// Builder-style variant of [`add_item`](Self::add_item)
    pub fn with_item(mut self, item: PermissionItem) -> Self {
        self.add_item(item);
        self
    }

    /// Overwrite the item stored under the new item's key.
    ///
    /// Only alter passes should use this; it is the one way to take something
    /// away from an item while building.
    pub fn replace_item(&mut self, item: PermissionItem) -> Option<PermissionItem> {
        self.items.insert(item.key(), item)
    }

    /// Fold another builder's items and cacheability into this one
    pub fn merge(&mut self, other: PermissionsBuilder) -> &mut Self {
        for item in other.items.into_values() {
            merge_item_into(&mut self.items, item);
        }
        self.cache.absorb(&other.cache);
        self
    }

    /// Snapshot of the current items, for alter passes that rewrite while iterating
    pub fn snapshot(&self) -> Vec<PermissionItem> {
        self.items.values().cloned().collect()
    }

    /// Finish building; mutations from here on overwrite and remove
    pub fn seal(self) -> SealedPermissions {
        SealedPermissions {
            items: self.items,
            cache: self.cache,
        }
    }
}

/// Permissions after every calculator ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SealedPermissions {
    items: ItemMap,
    cache: CacheMetadata,
}

impl SealedPermissions {
    /// Store an item, replacing whatever was under its key
    pub fn add_item(&mut self, item: PermissionItem) -> Option<PermissionItem> {
        self.items.insert(item.key(), item)
    }

    pub fn remove_item(&mut self, scope: &str, identifier: &Identifier) -> Option<PermissionItem> {
        self.items.remove(&ItemKey::new(scope, identifier.clone()))
    }

    /// Remove every item of a scope, returning how many were removed
    pub fn remove_items_by_scope(&mut self, scope: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|key, _| key.scope != scope);
        before - self.items.len()
    }

    /// Make the result immutable
    pub fn freeze(self) -> PermissionsCollection {
        PermissionsCollection::from_parts(self.items, self.cache)
    }
}

impl Cacheable for PermissionsBuilder {
    fn cache_metadata(&self) -> &CacheMetadata {
        &self.cache
    }
}

impl RefinableCacheable for PermissionsBuilder {
    fn cache_metadata_mut(&mut self) -> &mut CacheMetadata {
        &mut self.cache
    }
}

impl CalculatedPermissions for PermissionsBuilder {
    fn item_map(&self) -> &ItemMap {
        &self.items
    }
}

impl Cacheable for SealedPermissions {
    fn cache_metadata(&self) -> &CacheMetadata {
        &self.cache
    }
}

impl RefinableCacheable for SealedPermissions {
    fn cache_metadata_mut(&mut self) -> &mut CacheMetadata {
        &mut self.cache
    }
}

impl CalculatedPermissions for SealedPermissions {
    fn item_map(&self) -> &ItemMap {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_merges_same_key() {
        let mut builder = PermissionsBuilder::new();
        builder
            .add_item(PermissionItem::new("s", 1, ["bar"], false))
            .add_item(PermissionItem::new("s", 1, ["baz"], true));

        assert_eq!(builder.len(), 1);
        let item = builder.item("s", &Identifier::from(1)).unwrap();
        assert!(item.is_admin());
        assert!(item.permissions().is_empty());
    }

    #[test]
    fn test_replace_item_overwrites_while_building() {
        let mut builder = PermissionsBuilder::new()
            .with_item(PermissionItem::new("s", 1, ["old name"], false));

        builder.replace_item(PermissionItem::new("s", 1, ["new name"], false));
        let item = builder.item("s", &Identifier::from(1)).unwrap();
        assert!(item.has_permission("new name"));
        assert!(!item.has_permission("old name"));
    }

    #[test]
    fn test_builder_merge_carries_cache_metadata() {
        let mut a = PermissionsBuilder::new().with_item(PermissionItem::new("s", 1, ["a"], false));
        a.add_cache_tags(["group:1"]);

        let mut b = PermissionsBuilder::new().with_item(PermissionItem::new("s", 2, ["b"], false));
        b.add_cache_tags(["group:2"]);
        b.merge_cache_max_age(60);

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.cache_tags().len(), 2);
        assert_eq!(a.cache_max_age(), 60);
    }

    #[test]
    fn test_sealed_overwrites_and_removes() {
        let mut sealed = PermissionsBuilder::new()
            .with_item(PermissionItem::new("s", 1, ["bar"], false))
            .with_item(PermissionItem::new("t", 1, ["bar"], false))
            .seal();

        let previous = sealed.add_item(PermissionItem::new("s", 1, ["baz"], false));
        assert!(previous.is_some());
        let item = sealed.item("s", &Identifier::from(1)).unwrap();
        assert!(item.has_permission("baz"));
        assert!(!item.has_permission("bar"));

        assert!(sealed.remove_item("s", &Identifier::from(1)).is_some());
        assert!(sealed.item("s", &Identifier::from(1)).is_none());

        assert_eq!(sealed.remove_items_by_scope("t"), 1);
        assert!(sealed.is_empty());
    }

    #[test]
    fn test_items_by_scope() {
        let builder = PermissionsBuilder::new()
            .with_item(PermissionItem::new("individual", 1, ["a"], false))
            .with_item(PermissionItem::new("individual", 2, ["a"], false))
            .with_item(PermissionItem::new("insider", "club", ["a"], false));

        assert_eq!(builder.items_by_scope("individual").count(), 2);
        assert_eq!(builder.items_by_scope("outsider").count(), 0);
        assert_eq!(builder.scopes().len(), 2);
    }
}
