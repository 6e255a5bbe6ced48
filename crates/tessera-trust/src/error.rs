//! Trust registry error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from resolving an issuer's key material.
///
/// `Clone` so a single fetch result can be handed to every waiter.
#[derive(Debug, Clone, Error)]
pub enum TrustError {
    /// No usable key material: the refresh failed and nothing cached is
    /// within the grace period.
    #[error("trust domain unavailable for {issuer}: {reason}")]
    TrustDomainUnavailable {
        /// Issuer URL.
        issuer: String,
        /// Underlying cause.
        reason: String,
    },

    /// HTTP request failed or returned a non-success status.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Failure reason.
        reason: String,
    },

    /// A discovery document or key set could not be used.
    #[error("invalid issuer metadata from {url}: {reason}")]
    Discovery {
        /// Document URL.
        url: String,
        /// Failure reason.
        reason: String,
    },

    /// The fetch exceeded the configured timeout.
    #[error("key fetch for {issuer} timed out after {after:?}")]
    Timeout {
        /// Issuer URL.
        issuer: String,
        /// Configured timeout.
        after: Duration,
    },

    /// The background fetch task panicked or was cancelled.
    #[error("key fetch task for {issuer} failed: {reason}")]
    Task {
        /// Issuer URL.
        issuer: String,
        /// Failure reason.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type for trust registry operations.
pub type TrustResult<T> = Result<T, TrustError>;
