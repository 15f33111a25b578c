//! Permission chain orchestrating calculators and both cache tiers

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use warden_caching::{
    Cache, CacheResult, Fingerprint, InMemoryCache, MemoryPersistentCache, PersistentPermissionCache,
    StoreConfig,
};
use warden_core::{
    Account, Cacheable, CalculatedPermissions, Mergeable, PermissionsBuilder, PermissionsCollection,
    RefinableCacheable,
};

use crate::calculator::PermissionCalculator;
use crate::context::{is_user_context, trim_user_contexts, ContextResolver, DefaultContextResolver};
use crate::error::{ChainError, ChainResult};
use crate::switcher::{AccountSwitcher, InMemoryAccountSwitcher, SwitchGuard};

/// Tag carried by every calculated collection
pub const PERMISSIONS_CACHE_TAG: &str = "warden_permissions";

type StaticCache = Box<dyn Cache<Fingerprint, PermissionsCollection>>;

/// Which cache tiers a chain uses and how they are stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSettings {
    /// In-process tier, `None` disables it
    pub static_cache: Option<StoreConfig>,

    /// Shared tier, `None` disables it
    pub persistent_cache: Option<StoreConfig>,
}

impl CacheSettings {
    /// Both tiers enabled with unbounded in-memory stores
    pub fn in_memory() -> Self {
        Self {
            static_cache: Some(StoreConfig::in_memory()),
            persistent_cache: Some(StoreConfig::in_memory()),
        }
    }

    /// No caching at all
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Resolves an account's permissions for a scope through the registered
/// calculators, caching results in an in-process tier and a shared tier.
pub struct PermissionChain {
    calculators: Vec<Arc<dyn PermissionCalculator>>,
    switcher: Arc<dyn AccountSwitcher>,
    context_resolver: Arc<dyn ContextResolver>,
    static_cache: Option<StaticCache>,
    persistent_cache: Option<Arc<dyn PersistentPermissionCache>>,
}

impl PermissionChain {
    pub fn builder() -> PermissionChainBuilder {
        PermissionChainBuilder::new()
    }

    /// Chain with cache tiers built from `settings`
    pub fn from_config(
        settings: &CacheSettings,
        calculators: Vec<Arc<dyn PermissionCalculator>>,
        switcher: Arc<dyn AccountSwitcher>,
    ) -> ChainResult<Self> {
        calculators
            .into_iter()
            .fold(PermissionChainBuilder::new(), |builder, calculator| {
                builder.calculator(calculator)
            })
            .account_switcher(switcher)
            .cache_settings(settings)?
            .build()
    }

    /// Resolve the permissions `account` has in `scope`
    pub async fn resolve(&self, account: &Account, scope: &str) -> ChainResult<PermissionsCollection> {
        let contexts = self.persistent_cache_contexts(scope);
        let key = self.fingerprint(account, scope, &contexts);

        if let Some(hit) = self.static_lookup(&key).await {
            debug!("Static cache hit for {}", key);
            return Ok(hit);
        }

        if let Some(hit) = self.persistent_lookup(&key).await {
            debug!("Persistent cache hit for {}", key);
            self.static_store(key, &hit).await;
            return Ok(hit);
        }

        debug!("Calculating permissions for {}", key);
        let collection = self.calculate(account, scope, &contexts)?;

        self.persistent_store(&key, &collection).await;
        self.static_store(key, &collection).await;

        Ok(collection)
    }

    /// Resolve several scopes and merge the results
    pub async fn resolve_scopes(&self, account: &Account, scopes: &[&str]) -> ChainResult<PermissionsCollection> {
        let mut merged: Option<PermissionsCollection> = None;
        for scope in scopes {
            let resolved = self.resolve(account, scope).await?;
            merged = Some(match merged {
                Some(current) => current.merge(&resolved),
                None => resolved,
            });
        }

        Ok(merged.unwrap_or_else(PermissionsCollection::empty))
    }

    /// Invalidate persistent entries carrying any of `tags` and reset the static tier
    pub async fn invalidate_tags(&self, tags: &[String]) {
        if tags.is_empty() {
            return;
        }

        if let Some(cache) = &self.persistent_cache {
            match cache.invalidate_tags(tags).await {
                Ok(removed) => debug!("Invalidated {} persistent entries for {:?}", removed, tags),
                Err(e) => warn!("Failed to invalidate persistent permission cache: {}", e),
            }
        }

        self.reset_static_cache().await;
    }

    /// Forget everything held in the static tier
    pub async fn reset_static_cache(&self) {
        if let Some(cache) = &self.static_cache {
            if let Err(e) = cache.clear().await {
                warn!("Failed to clear static permission cache: {}", e);
            }
        }
    }

    /// Calculators taking part in resolving `scope`, in registration order
    pub fn calculators_for(&self, scope: &str) -> Vec<Arc<dyn PermissionCalculator>> {
        self.applicable(scope).cloned().collect()
    }

    /// Union of the contexts the applicable calculators declare for `scope`
    pub fn persistent_cache_contexts(&self, scope: &str) -> BTreeSet<String> {
        self.applicable(scope)
            .flat_map(|calculator| calculator.persistent_cache_contexts(scope))
            .collect()
    }

    /// Cache key for `account` in `scope` with contexts materialised as `name=value`
    pub fn fingerprint(&self, account: &Account, scope: &str, contexts: &BTreeSet<String>) -> Fingerprint {
        let materialised = contexts
            .iter()
            .map(|context| self.context_resolver.key_for(context, account));
        Fingerprint::new(scope, account.id, materialised)
    }

    fn applicable<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Arc<dyn PermissionCalculator>> + 'a {
        self.calculators
            .iter()
            .filter(move |calculator| calculator.applies_to(scope))
    }

    fn calculate(
        &self,
        account: &Account,
        scope: &str,
        contexts: &BTreeSet<String>,
    ) -> ChainResult<PermissionsCollection> {
        let mut builder = PermissionsBuilder::new();

        for calculator in self.applicable(scope) {
            let calculated = {
                let _guard = self.switch_for(calculator.as_ref(), account, scope);
                calculator
                    .calculate(account, scope)
                    .map_err(|source| ChainError::Calculator {
                        calculator: calculator.name().to_string(),
                        source,
                    })?
            };

            if let Some(item) = calculated.items().find(|item| item.scope() != scope) {
                return Err(ChainError::ScopeMismatch {
                    calculator: calculator.name().to_string(),
                    expected: scope.to_string(),
                    actual: item.scope().to_string(),
                });
            }

            builder.merge(calculated);
        }

        for calculator in self.applicable(scope) {
            let _guard = self.switch_for(calculator.as_ref(), account, scope);
            calculator.alter(&mut builder);
        }

        builder.add_cache_contexts(trim_user_contexts(contexts));
        let mut sealed = builder.seal();
        sealed.add_cache_tags([PERMISSIONS_CACHE_TAG]);

        Ok(sealed.freeze())
    }

    fn switch_for(&self, calculator: &dyn PermissionCalculator, account: &Account, scope: &str) -> SwitchGuard<'_> {
        let varies_by_user = calculator
            .persistent_cache_contexts(scope)
            .iter()
            .any(|context| is_user_context(context));

        if varies_by_user {
            SwitchGuard::switch_to(self.switcher.as_ref(), account)
        } else {
            SwitchGuard::inactive(self.switcher.as_ref())
        }
    }

    async fn static_lookup(&self, key: &Fingerprint) -> Option<PermissionsCollection> {
        let cache = self.static_cache.as_ref()?;
        swallow(cache.get(key).await, "static lookup").flatten()
    }

    async fn persistent_lookup(&self, key: &Fingerprint) -> Option<PermissionsCollection> {
        let cache = self.persistent_cache.as_ref()?;
        swallow(cache.get(key).await, "persistent lookup").flatten()
    }

    async fn static_store(&self, key: Fingerprint, collection: &PermissionsCollection) {
        let Some(cache) = &self.static_cache else {
            return;
        };

        let result = match collection.cache_max_age() {
            0 => return,
            max_age if max_age < 0 => cache.put(key, collection.clone()).await,
            max_age => {
                cache
                    .put_with_ttl(key, collection.clone(), Duration::from_secs(max_age as u64))
                    .await
            }
        };
        swallow(result, "static store");
    }

    async fn persistent_store(&self, key: &Fingerprint, collection: &PermissionsCollection) {
        let Some(cache) = &self.persistent_cache else {
            return;
        };

        let result = cache
            .set(
                key.clone(),
                collection,
                collection.cache_tags(),
                collection.cache_contexts(),
                collection.cache_max_age(),
            )
            .await;
        swallow(result, "persistent store");
    }
}

/// Cache errors never fail a resolve
fn swallow<T>(result: CacheResult<T>, operation: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Permission cache {} failed, continuing without it: {}", operation, e);
            None
        }
    }
}

/// Assembles a [`PermissionChain`]
pub struct PermissionChainBuilder {
    calculators: Vec<Arc<dyn PermissionCalculator>>,
    switcher: Option<Arc<dyn AccountSwitcher>>,
    context_resolver: Option<Arc<dyn ContextResolver>>,
    static_cache: Option<StaticCache>,
    persistent_cache: Option<Arc<dyn PersistentPermissionCache>>,
}

impl PermissionChainBuilder {
    pub fn new() -> Self {
        Self {
            calculators: Vec::new(),
            switcher: None,
            context_resolver: None,
            static_cache: None,
            persistent_cache: None,
        }
    }

    /// Register a calculator; calculators run in registration order
    pub fn calculator(mut self, calculator: Arc<dyn PermissionCalculator>) -> Self {
        self.calculators.push(calculator);
        self
    }

    pub fn account_switcher(mut self, switcher: Arc<dyn AccountSwitcher>) -> Self {
        self.switcher = Some(switcher);
        self
    }

    pub fn context_resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
        self.context_resolver = Some(resolver);
        self
    }

    pub fn static_cache(mut self, cache: StaticCache) -> Self {
        self.static_cache = Some(cache);
        self
    }

    /// Static tier backed by an unbounded in-memory store
    pub fn in_memory_static_cache(self) -> Self {
        self.static_cache(Box::new(InMemoryCache::new()))
    }

    pub fn persistent_cache(mut self, cache: Arc<dyn PersistentPermissionCache>) -> Self {
        self.persistent_cache = Some(cache);
        self
    }

    /// Build both tiers from `settings`, replacing any set before
    pub fn cache_settings(mut self, settings: &CacheSettings) -> ChainResult<Self> {
        self.static_cache = settings
            .static_cache
            .as_ref()
            .map(|config| config.build())
            .transpose()
            .map_err(|e| ChainError::InvalidConfig(format!("static cache: {}", e)))?;

        self.persistent_cache = match &settings.persistent_cache {
            Some(config) => {
                let cache = MemoryPersistentCache::new(config)
                    .map_err(|e| ChainError::InvalidConfig(format!("persistent cache: {}", e)))?;
                Some(Arc::new(cache) as Arc<dyn PersistentPermissionCache>)
            }
            None => None,
        };

        Ok(self)
    }

    pub fn build(self) -> ChainResult<PermissionChain> {
        let mut seen = BTreeSet::new();
        for calculator in &self.calculators {
            if !seen.insert(calculator.name().to_string()) {
                return Err(ChainError::InvalidConfig(format!(
                    "calculator '{}' registered twice",
                    calculator.name()
                )));
            }
        }

        Ok(PermissionChain {
            calculators: self.calculators,
            switcher: self
                .switcher
                .unwrap_or_else(|| Arc::new(InMemoryAccountSwitcher::new(Account::anonymous()))),
            context_resolver: self
                .context_resolver
                .unwrap_or_else(|| Arc::new(DefaultContextResolver::new())),
            static_cache: self.static_cache,
            persistent_cache: self.persistent_cache,
        })
    }
}

impl Default for PermissionChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
