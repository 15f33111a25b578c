//! Permission scopes: how an account relates to a group

/// Roles granted to the account through its own membership of a group
pub const INDIVIDUAL: &str = "individual";

/// Roles synchronized from global roles for groups the account is a member of
pub const INSIDER: &str = "insider";

/// Roles synchronized from global roles for groups the account is not a member of
pub const OUTSIDER: &str = "outsider";

/// Every scope, in evaluation order
pub const ALL: [&str; 3] = [INDIVIDUAL, INSIDER, OUTSIDER];

/// Synchronized scopes derive from global roles rather than per-group assignment
pub fn is_synchronized(scope: &str) -> bool {
    scope == INSIDER || scope == OUTSIDER
}
