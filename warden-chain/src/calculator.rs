//! Pluggable permission calculators

use std::collections::BTreeSet;
use warden_core::{Account, PermissionsBuilder};

use crate::error::CalculatorError;

/// Produces one scope's permissions for an account
///
/// Calculators run in registration order. Each `calculate` result is merged
/// into a shared builder, after which every calculator gets an `alter` pass
/// over that still-open builder.
pub trait PermissionCalculator: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Whether the calculator takes part in resolving `scope`
    fn applies_to(&self, _scope: &str) -> bool {
        true
    }

    /// Calculate the permissions for `scope`. Every returned item must belong
    /// to `scope`; calculators that do not serve the scope return an empty builder.
    fn calculate(&self, account: &Account, scope: &str) -> Result<PermissionsBuilder, CalculatorError>;

    /// Rewrite items contributed by any calculator
    fn alter(&self, _builder: &mut PermissionsBuilder) {}

    /// Contexts, beyond the account itself, the output for `scope` varies by
    fn persistent_cache_contexts(&self, _scope: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}
