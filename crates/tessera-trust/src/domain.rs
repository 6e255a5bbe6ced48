//! Cached issuer key material and freshness policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tessera_crypto::KeySet;

/// Freshness and fetch limits of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// How long fetched keys are used without refreshing.
    pub ttl: Duration,
    /// How long past `ttl` stale keys may still be served when a refresh fails.
    pub grace_period: Duration,
    /// Upper bound on one discovery + key set fetch.
    pub fetch_timeout: Duration,
    /// After a failed refresh, how long stale keys within the grace period
    /// are served without trying again.
    pub failure_backoff: Duration,
}

impl RegistryConfig {
    /// Default key cache TTL.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
    /// Default grace period after a failed refresh.
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(60 * 60);
    /// Default fetch timeout.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default backoff after a failed refresh.
    pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(30);
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl: Self::DEFAULT_TTL,
            grace_period: Self::DEFAULT_GRACE_PERIOD,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            failure_backoff: Self::DEFAULT_FAILURE_BACKOFF,
        }
    }
}

/// One issuer's key material and when it was fetched.
#[derive(Debug, Clone)]
pub struct TrustDomain {
    issuer: String,
    keys: Arc<KeySet>,
    fetched_at: Instant,
}

impl TrustDomain {
    /// Record key material fetched just now.
    #[must_use]
    pub fn new(issuer: impl Into<String>, keys: Arc<KeySet>) -> Self {
        Self::fetched_at(issuer, keys, Instant::now())
    }

    pub(crate) fn fetched_at(issuer: impl Into<String>, keys: Arc<KeySet>, at: Instant) -> Self {
        Self {
            issuer: issuer.into(),
            keys,
            fetched_at: at,
        }
    }

    /// Issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Shared handle to the key set.
    #[must_use]
    pub fn keys(&self) -> Arc<KeySet> {
        Arc::clone(&self.keys)
    }

    /// Time since the keys were fetched.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Whether the keys may be used without refreshing.
    #[must_use]
    pub fn is_fresh(&self, config: &RegistryConfig) -> bool {
        self.age() < config.ttl
    }

    /// Whether the keys may still be served after a failed refresh.
    #[must_use]
    pub fn is_within_grace(&self, config: &RegistryConfig) -> bool {
        self.age() < config.ttl.saturating_add(config.grace_period)
    }
}

/// Diagnostic view of one cached issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    /// Issuer URL.
    pub issuer: String,
    /// Number of keys held.
    pub key_count: usize,
    /// Time since the keys were fetched.
    pub age: Duration,
    /// Whether the keys are within the TTL.
    pub fresh: bool,
    /// Whether the issuer is local (never fetched).
    pub local: bool,
}
