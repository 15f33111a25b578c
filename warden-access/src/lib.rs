//! Query access conditions for Warden
//!
//! [`AccessConditionBuilder`] turns a resolved permission collection into a
//! [`QueryRestriction`]: a serialisable tree of AND/OR groups over leaf
//! comparisons, plus the joins a query executor must add for it.

pub mod builder;
pub mod condition;
pub mod error;
pub mod meta;

pub use builder::{AccessConditionBuilder, DATA_ALIAS, MEMBERSHIP_ALIAS, RELATIONSHIP_ALIAS};
pub use condition::{
    Comparison, Condition, ConditionGroup, Conjunction, FieldRef, Join, JoinKind, Operator, QueryRestriction, Value,
};
pub use error::{AccessError, AccessResult};
pub use meta::{EntityAccessMeta, Operation, QueryLayout};
