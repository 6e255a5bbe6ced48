//! Policy error types.

use tessera_token::TokenError;
use tessera_trust::TrustError;
use thiserror::Error;

/// Errors from building or evaluating a policy.
///
/// During evaluation these describe why one (transport, issuer) pair
/// failed; they are logged and never returned to the client.
#[derive(Debug, Clone, Error)]
pub enum PolicyError {
    /// An [`AuthOption`](crate::AuthOption) is unusable.
    #[error("invalid auth option: {0}")]
    InvalidOption(String),

    /// The option names an issuer this process has no URL for.
    #[error("issuer not configured: {0}")]
    IssuerNotConfigured(&'static str),

    /// The issuer's keys could not be resolved.
    #[error(transparent)]
    Trust(#[from] TrustError),

    /// The candidate token was rejected.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl PolicyError {
    /// Short stable label for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidOption(_) => "invalid_option",
            Self::IssuerNotConfigured(_) => "issuer_not_configured",
            Self::Trust(_) => "trust_domain_unavailable",
            Self::Token(e) => e.kind(),
        }
    }
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
