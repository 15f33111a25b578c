//! Core permission values for Warden
//!
//! This crate holds the immutable values the rest of the workspace passes around:
//! - [`PermissionItem`]: one scope's permissions for one identifier
//! - [`PermissionsBuilder`] / [`SealedPermissions`] / [`PermissionsCollection`]:
//!   the build, seal and freeze phases of a calculated result
//! - [`CacheMetadata`] and the [`Cacheable`] traits shared by all of them
//! - [`PermissionName`]: the permission-name grammar

pub mod account;
pub mod builder;
pub mod cacheable;
pub mod calculated;
pub mod collection;
pub mod error;
pub mod item;
pub mod permission_name;
pub mod scope;

// Re-export main types
pub use account::{Account, AccountId, Identifier, ANONYMOUS_ROLE, AUTHENTICATED_ROLE};
pub use builder::{PermissionsBuilder, SealedPermissions};
pub use cacheable::{merge_max_age, CacheMetadata, Cacheable, Mergeable, RefinableCacheable, PERMANENT};
pub use calculated::{CalculatedPermissions, ItemMap};
pub use collection::PermissionsCollection;
pub use error::{CoreError, CoreResult};
pub use item::{ItemKey, PermissionItem};
pub use permission_name::{Ownership, PermissionName};
