//! Accounts and permission subject identifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Global role every anonymous account carries
pub const ANONYMOUS_ROLE: &str = "anonymous";

/// Global role every logged-in account carries
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// Account identifier; `0` is the anonymous account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl AccountId {
    pub const ANONYMOUS: AccountId = AccountId(0);

    pub fn is_anonymous(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The account permissions are calculated for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: AccountId,

    /// Global (site-wide) roles
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Account {
    /// Create an account carrying the implicit role for its kind
    pub fn new(id: impl Into<AccountId>) -> Self {
        let id = id.into();
        let implicit = if id.is_anonymous() {
            ANONYMOUS_ROLE
        } else {
            AUTHENTICATED_ROLE
        };

        Self {
            id,
            roles: BTreeSet::from([implicit.to_string()]),
        }
    }

    /// The anonymous account
    pub fn anonymous() -> Self {
        Self::new(AccountId::ANONYMOUS)
    }

    /// Add a global role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.id.is_anonymous()
    }
}

/// Subject a permission item applies to within its scope, such as a group ID
/// or a group type machine name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Str(String),
}

impl Identifier {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Identifier::Int(value) => Some(*value),
            Identifier::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Identifier::Int(_) => None,
            Identifier::Str(value) => Some(value),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(value) => write!(f, "{}", value),
            Identifier::Str(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Int(value)
    }
}

impl From<i32> for Identifier {
    fn from(value: i32) -> Self {
        Identifier::Int(value.into())
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Str(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Str(value)
    }
}
