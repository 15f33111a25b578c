//! Entity kind capabilities and query layout

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{AccessError, AccessResult};

/// Operation a query is restricted for
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operation {
    View,
    Update,
    Delete,
    Other(String),
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Operation::View => "view",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Other(name) => name,
        }
    }
}

impl FromStr for Operation {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Operation::View),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other if !other.is_empty() && other.chars().all(|c| c.is_ascii_lowercase() || c == '_') => {
                Ok(Operation::Other(other.to_string()))
            }
            other => Err(AccessError::InvalidOperation(other.to_string())),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        operation.as_str().to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_operations() -> BTreeSet<Operation> {
    [Operation::View, Operation::Update, Operation::Delete].into_iter().collect()
}

/// What the access builder needs to know about an entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAccessMeta {
    /// Kind name as it appears in permission names
    pub kind: String,

    /// Table holding owner and status columns
    pub data_table: String,

    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Owner column; `None` when the kind has no owner
    #[serde(default)]
    pub owner_column: Option<String>,

    /// Published flag column; `None` when the kind is not publishable
    #[serde(default)]
    pub status_column: Option<String>,

    /// Whether `administer <kind>` grants full access
    #[serde(default)]
    pub admin_permission: bool,

    #[serde(default = "default_operations")]
    pub operations: BTreeSet<Operation>,

    /// Relationship plugin ids linking the kind to groups
    #[serde(default)]
    pub relationship_plugins: Vec<String>,
}

impl EntityAccessMeta {
    pub fn new(kind: impl Into<String>, data_table: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data_table: data_table.into(),
            id_column: default_id_column(),
            owner_column: None,
            status_column: None,
            admin_permission: false,
            operations: default_operations(),
            relationship_plugins: Vec::new(),
        }
    }

    pub fn ownable(mut self, owner_column: impl Into<String>) -> Self {
        self.owner_column = Some(owner_column.into());
        self
    }

    pub fn publishable(mut self, status_column: impl Into<String>) -> Self {
        self.status_column = Some(status_column.into());
        self
    }

    pub fn with_admin_permission(mut self) -> Self {
        self.admin_permission = true;
        self
    }

    /// Replace the supported operations
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    pub fn with_relationship_plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.relationship_plugins.push(plugin_id.into());
        self
    }

    pub fn is_ownable(&self) -> bool {
        self.owner_column.is_some()
    }

    pub fn is_publishable(&self) -> bool {
        self.status_column.is_some()
    }

    pub fn supports(&self, operation: &Operation) -> bool {
        self.operations.contains(operation)
    }

    /// Check the metadata is usable for building conditions
    pub fn validate(&self) -> AccessResult<()> {
        let invalid = |message: &str| AccessError::InvalidMeta {
            kind: self.kind.clone(),
            message: message.to_string(),
        };

        if self.kind.trim().is_empty() {
            return Err(invalid("kind cannot be empty"));
        }
        if self.data_table.trim().is_empty() {
            return Err(invalid("data_table cannot be empty"));
        }
        if self.relationship_plugins.is_empty() {
            return Err(invalid("at least one relationship plugin is required"));
        }
        Ok(())
    }
}

/// Table and column names of the group relationship storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLayout {
    /// Alias of the restricted query's base table
    pub base_alias: String,
    pub relationship_table: String,
    pub entity_id_column: String,
    pub group_id_column: String,
    pub group_type_column: String,
    pub plugin_id_column: String,
    /// Plugin id of membership relationships
    pub membership_plugin: String,
}

impl Default for QueryLayout {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing() {
        assert_eq!("view".parse::<Operation>().unwrap(), Operation::View);
        assert_eq!(
            "publish".parse::<Operation>().unwrap(),
            Operation::Other("publish".to_string())
        );
        assert!("View it".parse::<Operation>().is_err());
        assert!("".parse::<Operation>().is_err());
    }

    #[test]
    fn test_meta_from_yaml() {
        let yaml = r#"
kind: page
data_table: node_field_data
owner_column: uid
status_column: status
admin_permission: true
relationship_plugins: [group_node_page]
"#;
        let meta: EntityAccessMeta = serde_yaml::from_str(yaml).unwrap();
        assert!(meta.is_ownable());
        assert!(meta.is_publishable());
        assert!(meta.supports(&Operation::View));
        assert!(!meta.supports(&Operation::Other("publish".to_string())));
        assert_eq!(meta.id_column, "id");
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_meta_validation() {
        let meta = EntityAccessMeta::new("page", "node_field_data");
        assert!(matches!(meta.validate(), Err(AccessError::InvalidMeta { .. })));
    }
}
