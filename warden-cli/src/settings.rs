//! Mapping from loaded configuration to library settings

use anyhow::Result;
use warden_access::QueryLayout;
use warden_caching::{StoreConfig, StoreKind};
use warden_chain::CacheSettings;
use warden_config::{AccessConfig, CacheConfig, TierConfig};

fn store_config(tier: &TierConfig) -> Result<Option<StoreConfig>> {
    if !tier.enabled {
        return Ok(None);
    }

    Ok(Some(StoreConfig {
        kind: tier.backend.parse::<StoreKind>()?,
        capacity: tier.capacity,
        default_ttl: tier.ttl,
    }))
}

pub fn cache_settings(config: &CacheConfig) -> Result<CacheSettings> {
    Ok(CacheSettings {
        static_cache: store_config(&config.static_cache)?,
        persistent_cache: store_config(&config.persistent_cache)?,
    })
}

pub fn query_layout(config: &AccessConfig) -> QueryLayout {
    QueryLayout {
        base_alias: config.base_alias.clone(),
        relationship_table: config.relationship_table.clone(),
        entity_id_column: config.entity_id_column.clone(),
        group_id_column: config.group_id_column.clone(),
        group_type_column: config.group_type_column.clone(),
        plugin_id_column: config.plugin_id_column.clone(),
        membership_plugin: config.membership_plugin.clone(),
    }
}
