//! Fixture files the permission commands run against

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use warden_access::EntityAccessMeta;
use warden_chain::{CacheSettings, InMemoryAccountSwitcher, PermissionCalculator, PermissionChain};
use warden_core::Account;
use warden_group::{
    GroupFixture, IndividualGroupPermissionCalculator, InMemoryGroupStore, PermissionAliasCalculator,
    SynchronizedGroupPermissionCalculator,
};

/// Groups plus the entity kinds queries can be restricted for
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(flatten)]
    pub groups: GroupFixture,

    #[serde(default)]
    pub entities: Vec<EntityAccessMeta>,

    /// Permission aliases applied after calculation
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse fixture {}", path.display()))
    }

    pub fn entity(&self, kind: &str) -> Result<&EntityAccessMeta> {
        self.entities
            .iter()
            .find(|meta| meta.kind == kind)
            .ok_or_else(|| anyhow::anyhow!("Entity kind '{}' is not declared in the fixture", kind))
    }
}

/// Store and chain built from a fixture
pub struct Runtime {
    pub store: Arc<InMemoryGroupStore>,
    pub chain: Arc<PermissionChain>,
}

impl Runtime {
    pub fn new(fixture: &Fixture, settings: &CacheSettings) -> Result<Self> {
        let store = Arc::new(
            InMemoryGroupStore::from_fixture(fixture.groups.clone()).context("Invalid group fixture")?,
        );

        let mut calculators: Vec<Arc<dyn PermissionCalculator>> = vec![
            Arc::new(IndividualGroupPermissionCalculator::new(store.clone())),
            Arc::new(SynchronizedGroupPermissionCalculator::new(store.clone())),
        ];
        if !fixture.aliases.is_empty() {
            calculators.push(Arc::new(PermissionAliasCalculator::new(fixture.aliases.clone())));
        }

        let switcher = Arc::new(InMemoryAccountSwitcher::new(Account::anonymous()));
        let chain = PermissionChain::from_config(settings, calculators, switcher)
            .context("Failed to build permission chain")?;

        Ok(Self {
            store,
            chain: Arc::new(chain),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_group::GroupStore;

    const FIXTURE: &str = r#"
group_types:
  - { id: club, label: Club }
groups:
  - { id: 1, group_type: club, label: Chess club }
roles:
  - { id: club-member, group_type: club, scope: individual, permissions: [view group] }
memberships:
  - { group_id: 1, account_id: 5, roles: [club-member] }
entities:
  - kind: page
    data_table: node_field_data
    owner_column: uid
    relationship_plugins: [group_node:page]
aliases:
  see group: view group
"#;

    #[test]
    fn test_fixture_parses_groups_and_entities() {
        let fixture: Fixture = serde_yaml::from_str(FIXTURE).unwrap();
        assert_eq!(fixture.groups.groups.len(), 1);
        assert!(fixture.entity("page").unwrap().is_ownable());
        assert!(fixture.entity("article").is_err());
        assert_eq!(fixture.aliases.len(), 1);
    }

    #[test]
    fn test_runtime_registers_alias_calculator() {
        let fixture: Fixture = serde_yaml::from_str(FIXTURE).unwrap();
        let runtime = Runtime::new(&fixture, &CacheSettings::disabled()).unwrap();
        assert_eq!(runtime.chain.calculators_for("individual").len(), 2);
        assert!(runtime.store.group(1).is_some());
    }
}
