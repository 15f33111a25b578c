//! Permission-name grammar shared by calculators and the query access builder
//!
//! ```text
//! administer <kind>
//! <op> any <kind> entity
//! <op> own <kind> entity
//! <op> any unpublished <kind> entity
//! <op> own unpublished <kind> entity
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a permission covers every record or only the account's own
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    Any,
    Own,
}

impl Ownership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ownership::Any => "any",
            Ownership::Own => "own",
        }
    }
}

/// A parsed permission name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionName {
    Administer {
        kind: String,
    },
    Entity {
        operation: String,
        ownership: Ownership,
        unpublished: bool,
        kind: String,
    },
}

impl PermissionName {
    pub fn administer(kind: impl Into<String>) -> Self {
        Self::Administer { kind: kind.into() }
    }

    pub fn any(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::entity(operation, Ownership::Any, false, kind)
    }

    pub fn own(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::entity(operation, Ownership::Own, false, kind)
    }

    pub fn any_unpublished(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::entity(operation, Ownership::Any, true, kind)
    }

    pub fn own_unpublished(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::entity(operation, Ownership::Own, true, kind)
    }

    pub fn entity(
        operation: impl Into<String>,
        ownership: Ownership,
        unpublished: bool,
        kind: impl Into<String>,
    ) -> Self {
        Self::Entity {
            operation: operation.into(),
            ownership,
            unpublished,
            kind: kind.into(),
        }
    }

    /// Parse a permission name; names outside the grammar yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(kind) = name.strip_prefix("administer ") {
            return is_token(kind).then(|| Self::administer(kind));
        }

        let body = name.strip_suffix(" entity")?;
        let tokens: Vec<&str> = body.split(' ').collect();
        let (operation, ownership, unpublished, kind) = match tokens.as_slice() {
            [operation, ownership, kind] => (*operation, *ownership, false, *kind),
            [operation, ownership, "unpublished", kind] => (*operation, *ownership, true, *kind),
            _ => return None,
        };

        let ownership = match ownership {
            "any" => Ownership::Any,
            "own" => Ownership::Own,
            _ => return None,
        };

        if !is_token(operation) || !is_token(kind) {
            return None;
        }

        Some(Self::entity(operation, ownership, unpublished, kind))
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Administer { kind } | Self::Entity { kind, .. } => kind,
        }
    }
}

fn is_token(value: &str) -> bool {
    !value.is_empty() && !value.contains(char::is_whitespace)
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Administer { kind } => write!(f, "administer {}", kind),
            Self::Entity {
                operation,
                ownership,
                unpublished,
                kind,
            } => {
                if *unpublished {
                    write!(f, "{} {} unpublished {} entity", operation, ownership.as_str(), kind)
                } else {
                    write!(f, "{} {} {} entity", operation, ownership.as_str(), kind)
                }
            }
        }
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_text() {
        assert_eq!(PermissionName::administer("page").to_string(), "administer page");
        assert_eq!(PermissionName::any("view", "page").to_string(), "view any page entity");
        assert_eq!(PermissionName::own("update", "page").to_string(), "update own page entity");
        assert_eq!(
            PermissionName::any_unpublished("view", "page").to_string(),
            "view any unpublished page entity"
        );
        assert_eq!(
            PermissionName::own_unpublished("view", "page").to_string(),
            "view own unpublished page entity"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            PermissionName::parse("view own unpublished group_node:page entity"),
            Some(PermissionName::own_unpublished("view", "group_node:page"))
        );
        assert_eq!(
            PermissionName::parse("delete any page entity"),
            Some(PermissionName::any("delete", "page"))
        );
        assert_eq!(
            PermissionName::parse("administer page"),
            Some(PermissionName::administer("page"))
        );
    }

    #[test]
    fn test_parse_rejects_outside_grammar() {
        assert_eq!(PermissionName::parse("view group"), None);
        assert_eq!(PermissionName::parse("view some page entity"), None);
        assert_eq!(PermissionName::parse("view any draft page entity"), None);
        assert_eq!(PermissionName::parse("administer "), None);
        assert_eq!(PermissionName::parse("administer two words"), None);
    }
}
