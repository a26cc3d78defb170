//! Proxy manager: provider registry plus the rotation pool.
//!
//! The manager owns the one [`ProxyPool`] the orchestrator selects from.
//! Providers feed the pool (`set_proxy` replaces its contents); the
//! request path only ever talks to the pool.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use parking_lot::RwLock;

use super::models::{ProxyPoolStats, ProxySnapshot};
use super::pool::ProxyPool;
use super::provider::{ProxyFilter, ProxyProvider};
use crate::error::ClientError;

/// Thread-safe proxy manager.
pub struct ProxyManager {
    providers: RwLock<HashMap<String, Arc<dyn ProxyProvider>>>,
    pool: Arc<ProxyPool>,
}

impl ProxyManager {
    /// Wrap an existing pool (usually built from client configuration).
    #[must_use]
    pub fn new(pool: Arc<ProxyPool>) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            pool,
        }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    /// Register a provider under its own name.
    pub fn add_provider(&self, provider: Arc<dyn ProxyProvider>) {
        self.providers
            .write()
            .insert(provider.name().to_string(), provider);
    }

    /// Remove a provider. Returns whether it was registered.
    pub fn remove_provider(&self, name: &str) -> bool {
        self.providers.write().remove(name).is_some()
    }

    /// Registered provider names.
    #[must_use]
    pub fn list_providers(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn ProxyProvider>, ClientError> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::ProviderNotFound(name.to_string()))
    }

    /// Fetch proxies from a provider and make them the active pool.
    ///
    /// `count` of 0 or 1 fetches a single proxy; larger counts set up a
    /// rotation set. Existing pool entries (and their health) are replaced.
    pub fn set_proxy(
        &self,
        provider_name: &str,
        filter: &ProxyFilter,
        count: usize,
    ) -> Result<(), ClientError> {
        let provider = self.provider(provider_name)?;
        let configs = if count > 1 {
            provider.get_proxies(count, filter)?
        } else {
            vec![provider.get_proxy(filter)?]
        };

        info!(
            "activating {} proxies from provider '{}'",
            configs.len(),
            provider_name
        );
        self.pool.replace_all(configs);
        Ok(())
    }

    /// Make a single, directly-specified proxy the active pool.
    pub fn set_proxy_url(&self, url: &str) -> Result<(), ClientError> {
        let config = crate::proxy::models::ProxyConfig::parse(url)?;
        self.pool.replace_all(vec![config]);
        Ok(())
    }

    /// Advance rotation and return the next proxy, if any.
    #[must_use]
    pub fn switch_proxy(&self) -> Option<ProxySnapshot> {
        self.pool.get_proxy()
    }

    /// Drop all pool entries (run proxy-less from here on).
    pub fn reset_proxy(&self) {
        self.pool.clear();
    }

    /// Ask a provider to refresh its list, then re-activate it.
    pub fn refresh_provider(&self, name: &str, filter: &ProxyFilter, count: usize) -> Result<(), ClientError> {
        self.provider(name)?.refresh()?;
        self.set_proxy(name, filter, count)
    }

    /// Pool statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> ProxyPoolStats {
        self.pool.stats()
    }
}
