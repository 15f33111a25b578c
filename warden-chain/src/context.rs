//! Cache context materialisation

use std::collections::{BTreeSet, HashMap};
use warden_core::Account;

/// Context naming the account itself
pub const USER_CONTEXT: &str = "user";

/// Context naming the account's global roles
pub const USER_ROLES_CONTEXT: &str = "user.roles";

/// True for contexts that identify or describe the account
pub fn is_user_context(context: &str) -> bool {
    context == USER_CONTEXT || context.starts_with("user.")
}

/// Drop account-identity contexts.
///
/// Results are already keyed per account, so these must never bubble up into
/// the contexts a stored collection advertises.
pub fn trim_user_contexts<'a, I>(contexts: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    contexts
        .into_iter()
        .filter(|context| !is_user_context(context))
        .cloned()
        .collect()
}

/// Turns a context name into the value it has for the current request
pub trait ContextResolver: Send + Sync {
    fn resolve(&self, context: &str, account: &Account) -> Option<String>;

    /// `name=value` key used in a fingerprint; unresolvable contexts keep an empty value
    fn key_for(&self, context: &str, account: &Account) -> String {
        format!("{}={}", context, self.resolve(context, account).unwrap_or_default())
    }
}

/// Resolves user contexts from the account and everything else from fixed values
#[derive(Debug, Clone, Default)]
pub struct DefaultContextResolver {
    values: HashMap<String, String>,
}

impl DefaultContextResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value a non-user context resolves to
    pub fn with_value(mut self, context: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(context.into(), value.into());
        self
    }
}

impl ContextResolver for DefaultContextResolver {
    fn resolve(&self, context: &str, account: &Account) -> Option<String> {
        match context {
            USER_CONTEXT => Some(account.id.to_string()),
            USER_ROLES_CONTEXT => Some(
                account
                    .roles
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            "user.is_authenticated" => Some(account.is_authenticated().to_string()),
            other => self.values.get(other).cloned(),
        }
    }
}
