//! Query access layout configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};

/// Names of the group relationship storage the access builder queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub base_alias: String,
    pub relationship_table: String,
    pub entity_id_column: String,
    pub group_id_column: String,
    pub group_type_column: String,
    pub plugin_id_column: String,
    pub membership_plugin: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            base_alias: "base".to_string(),
            relationship_table: "group_relationship_field_data".to_string(),
            entity_id_column: "entity_id".to_string(),
            group_id_column: "gid".to_string(),
            group_type_column: "group_type".to_string(),
            plugin_id_column: "plugin_id".to_string(),
            membership_plugin: "group_membership".to_string(),
        }
    }
}

impl Validatable for AccessConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_required_string(&self.base_alias, "base_alias", domain)?;
        validate_required_string(&self.relationship_table, "relationship_table", domain)?;
        validate_required_string(&self.entity_id_column, "entity_id_column", domain)?;
        validate_required_string(&self.group_id_column, "group_id_column", domain)?;
        validate_required_string(&self.group_type_column, "group_type_column", domain)?;
        validate_required_string(&self.plugin_id_column, "plugin_id_column", domain)?;
        validate_required_string(&self.membership_plugin, "membership_plugin", domain)?;

        if self.base_alias == "rel" || self.base_alias == "mem" || self.base_alias == "data" {
            return Err(self.validation_error(format!(
                "base_alias '{}' clashes with a join alias",
                self.base_alias
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "access"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AccessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_alias_clash() {
        let config = AccessConfig {
            base_alias: "rel".to_string(),
            ..AccessConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
