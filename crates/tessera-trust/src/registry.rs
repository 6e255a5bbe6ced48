//! The issuer key registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tessera_crypto::KeySet;
use tracing::{debug, info, warn};

use crate::domain::{DomainInfo, RegistryConfig, TrustDomain};
use crate::error::{TrustError, TrustResult};
use crate::source::{HttpKeySource, KeySource};

type SharedFetch = Shared<BoxFuture<'static, TrustResult<Arc<KeySet>>>>;

/// Shared handle to the issuer key registry.
///
/// Cloning is cheap; all clones see the same cache.
#[derive(Clone)]
pub struct TrustRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    config: RegistryConfig,
    source: Arc<dyn KeySource>,
    local: HashMap<String, Arc<KeySet>>,
    cache: ArcSwap<HashMap<String, Arc<TrustDomain>>>,
    in_flight: Mutex<HashMap<String, (u64, SharedFetch)>>,
    failures: Mutex<HashMap<String, (Instant, TrustError)>>,
    next_fetch_id: AtomicU64,
}

/// Builder for [`TrustRegistry`].
pub struct TrustRegistryBuilder {
    config: RegistryConfig,
    source: Arc<dyn KeySource>,
    local: HashMap<String, Arc<KeySet>>,
}

impl TrustRegistryBuilder {
    /// Set freshness and fetch limits.
    #[must_use]
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an issuer whose keys are known locally and never fetched.
    #[must_use]
    pub fn local_issuer(mut self, issuer: &str, keys: KeySet) -> Self {
        self.local
            .insert(normalize(issuer).to_owned(), Arc::new(keys));
        self
    }

    /// Build the registry.
    #[must_use]
    pub fn build(self) -> TrustRegistry {
        TrustRegistry {
            inner: Arc::new(Inner {
                config: self.config,
                source: self.source,
                local: self.local,
                cache: ArcSwap::from_pointee(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }
}

impl TrustRegistry {
    /// Start building a registry that fetches remote keys from `source`.
    #[must_use]
    pub fn builder(source: Arc<dyn KeySource>) -> TrustRegistryBuilder {
        TrustRegistryBuilder {
            config: RegistryConfig::default(),
            source,
            local: HashMap::new(),
        }
    }

    /// Start building a registry that discovers remote keys over HTTP(S).
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Client`] if the HTTP client cannot be built.
    pub fn http_builder(discovery_path: &str) -> TrustResult<TrustRegistryBuilder> {
        let source = HttpKeySource::new()?.discovery_path(discovery_path);
        Ok(Self::builder(Arc::new(source)))
    }

    /// Freshness and fetch limits in effect.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Whether `issuer` is registered as local.
    #[must_use]
    pub fn is_local(&self, issuer: &str) -> bool {
        self.inner.local.contains_key(normalize(issuer))
    }

    /// Resolve the key set of `issuer`.
    ///
    /// Local issuers answer immediately. Remote issuers answer from cache
    /// while fresh; otherwise one fetch is made (shared with any concurrent
    /// callers). If that fetch fails, cached keys within the grace period are
    /// served, and keep being served without a new fetch for the configured
    /// failure backoff.
    ///
    /// The fetch runs on its own task, so it completes and is cleaned up
    /// even when every caller waiting on it is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::TrustDomainUnavailable`] when no usable key
    /// material exists.
    pub async fn resolve(&self, issuer: &str) -> TrustResult<Arc<KeySet>> {
        let issuer = normalize(issuer);
        if let Some(keys) = self.inner.local.get(issuer) {
            return Ok(Arc::clone(keys));
        }

        let config = &self.inner.config;
        if let Some(domain) = self.cached(issuer) {
            if domain.is_fresh(config) {
                return Ok(domain.keys());
            }
            if domain.is_within_grace(config)
                && let Some(err) = self.recent_failure(issuer)
            {
                debug!(issuer, error = %err, "refresh backing off, serving stale keys");
                return Ok(domain.keys());
            }
        }

        match self.fetch_coalesced(issuer).await {
            Ok(keys) => Ok(keys),
            Err(err) => match self.cached(issuer) {
                Some(domain) if domain.is_within_grace(config) => {
                    warn!(
                        issuer,
                        age_secs = domain.age().as_secs(),
                        error = %err,
                        "key refresh failed, serving stale keys"
                    );
                    Ok(domain.keys())
                },
                _ => {
                    warn!(issuer, error = %err, "no usable keys for issuer");
                    Err(TrustError::TrustDomainUnavailable {
                        issuer: issuer.to_owned(),
                        reason: err.to_string(),
                    })
                },
            },
        }
    }

    /// Drop the cached keys of `issuer`. Returns whether anything was cached.
    pub fn invalidate(&self, issuer: &str) -> bool {
        let issuer = normalize(issuer);
        let present = self.inner.cache.load().contains_key(issuer);
        self.inner
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(issuer);
        if present {
            self.inner.cache.rcu(|current| {
                let mut next = HashMap::clone(current);
                next.remove(issuer);
                next
            });
            debug!(issuer, "invalidated issuer keys");
        }
        present
    }

    /// Drop every cached remote issuer.
    pub fn clear(&self) {
        self.inner.cache.store(Arc::new(HashMap::new()));
        self.inner
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("cleared issuer key cache");
    }

    /// Describe every known issuer, local ones included, sorted by URL.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DomainInfo> {
        let config = &self.inner.config;
        let local = self.inner.local.iter().map(|(issuer, keys)| DomainInfo {
            issuer: issuer.clone(),
            key_count: keys.len(),
            age: std::time::Duration::ZERO,
            fresh: true,
            local: true,
        });
        let cache = self.inner.cache.load();
        let remote = cache.values().map(|domain| DomainInfo {
            issuer: domain.issuer().to_owned(),
            key_count: domain.keys().len(),
            age: domain.age(),
            fresh: domain.is_fresh(config),
            local: false,
        });

        let mut infos: Vec<DomainInfo> = local.chain(remote).collect();
        infos.sort_by(|a, b| a.issuer.cmp(&b.issuer));
        infos
    }

    fn cached(&self, issuer: &str) -> Option<Arc<TrustDomain>> {
        self.inner.cache.load().get(issuer).cloned()
    }

    fn store(&self, issuer: &str, keys: Arc<KeySet>) {
        let domain = Arc::new(TrustDomain::new(issuer, keys));
        self.inner.cache.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(issuer.to_owned(), Arc::clone(&domain));
            next
        });
    }

    fn recent_failure(&self, issuer: &str) -> Option<TrustError> {
        let backoff = self.inner.config.failure_backoff;
        self.inner
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(issuer)
            .filter(|(failed_at, _)| failed_at.elapsed() < backoff)
            .map(|(_, err)| err.clone())
    }

    async fn fetch_coalesced(&self, issuer: &str) -> TrustResult<Arc<KeySet>> {
        let fetch = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some((_, fetch)) = in_flight.get(issuer) {
                debug!(issuer, "joining in-flight key fetch");
                fetch.clone()
            } else {
                let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let task = tokio::spawn(self.clone().fetch(issuer.to_owned(), id));
                let owner = issuer.to_owned();
                let fetch = task
                    .map(move |joined| {
                        joined.unwrap_or_else(|err| {
                            Err(TrustError::Task {
                                issuer: owner,
                                reason: err.to_string(),
                            })
                        })
                    })
                    .boxed()
                    .shared();
                in_flight.insert(issuer.to_owned(), (id, fetch.clone()));
                fetch
            }
        };

        fetch.await
    }

    async fn fetch(self, issuer: String, fetch_id: u64) -> TrustResult<Arc<KeySet>> {
        let timeout = self.inner.config.fetch_timeout;
        let result = tokio::time::timeout(timeout, self.inner.source.fetch(&issuer))
            .await
            .unwrap_or_else(|_| {
                Err(TrustError::Timeout {
                    issuer: issuer.clone(),
                    after: timeout,
                })
            })
            .map(Arc::new);

        {
            let mut failures = self
                .inner
                .failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &result {
                Ok(keys) => {
                    self.store(&issuer, Arc::clone(keys));
                    failures.remove(&issuer);
                    info!(issuer = %issuer, keys = keys.len(), "refreshed issuer keys");
                },
                Err(err) => {
                    failures.insert(issuer.clone(), (Instant::now(), err.clone()));
                },
            }
        }

        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if in_flight.get(&issuer).is_some_and(|(id, _)| *id == fetch_id) {
            in_flight.remove(&issuer);
        }
        result
    }
}

impl std::fmt::Debug for TrustRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustRegistry")
            .field("config", &self.inner.config)
            .field("local", &self.inner.local.keys().collect::<Vec<_>>())
            .field("cached", &self.inner.cache.load().len())
            .finish_non_exhaustive()
    }
}

fn normalize(issuer: &str) -> &str {
    issuer.trim_end_matches('/')
}
