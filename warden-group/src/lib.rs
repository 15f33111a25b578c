//! Group permissions for Warden
//!
//! This crate provides the group domain the permission calculators read from:
//! - Group types, groups, roles and memberships with an in-memory store
//! - Calculators for the individual, insider and outsider scopes
//! - Role assignment validation
//! - Per-group permission checks through a [`warden_chain::PermissionChain`]

pub mod calculators;
pub mod checker;
pub mod error;
pub mod models;
pub mod store;
pub mod validation;

// Re-export main types
pub use calculators::{
    IndividualGroupPermissionCalculator, PermissionAliasCalculator, SynchronizedGroupPermissionCalculator,
};
pub use checker::GroupPermissionChecker;
pub use error::{GroupError, GroupResult};
pub use models::{Group, GroupRole, GroupType, Membership, RoleScope};
pub use store::{GroupFixture, GroupStore, InMemoryGroupStore, ROLE_LIST_TAG};
pub use validation::{RoleAssignmentValidator, RoleViolation};
