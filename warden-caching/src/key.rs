//! Cache key identifying one cacheable permission result

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::AccountId;

/// Composite key of (scope, account, materialised contexts).
///
/// Contexts are kept sorted and deduplicated so the same inputs always
/// produce the same key regardless of calculator registration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub scope: String,
    pub account_id: AccountId,
    pub contexts: Vec<String>,
}

impl Fingerprint {
    pub fn new<I, S>(scope: impl Into<String>, account_id: AccountId, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contexts: Vec<String> = contexts.into_iter().map(Into::into).collect();
        contexts.sort();
        contexts.dedup();

        Self {
            scope: scope.into(),
            account_id,
            contexts,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "warden:{}:{}:[{}]",
            self.scope,
            self.account_id,
            self.contexts.join(",")
        )
    }
}
