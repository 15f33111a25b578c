//! Permission chain for Warden
//!
//! [`PermissionChain`] asks every registered [`PermissionCalculator`] for a
//! scope's permissions, merges the answers and caches the frozen result in two
//! tiers: an in-process static cache and a shared, tag-invalidated persistent
//! cache.

pub mod calculator;
pub mod chain;
pub mod context;
pub mod error;
pub mod switcher;

// Re-export main types
pub use calculator::PermissionCalculator;
pub use chain::{CacheSettings, PermissionChain, PermissionChainBuilder, PERMISSIONS_CACHE_TAG};
pub use context::{is_user_context, ContextResolver, DefaultContextResolver, USER_CONTEXT, USER_ROLES_CONTEXT};
pub use error::{CalculatorError, ChainError, ChainResult};
pub use switcher::{AccountSwitcher, InMemoryAccountSwitcher, SwitchGuard, SwitchToken};
