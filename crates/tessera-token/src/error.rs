//! Token error types.

use thiserror::Error;

/// Why a single candidate credential was rejected.
///
/// Every variant is a per-candidate failure; none of them is fatal to the
/// evaluation of other candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The credential could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// No key of the issuer verifies the signature.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The `iss` claim names a different issuer than the one whose keys verified it.
    #[error("token issuer mismatch: expected {expected}, found {found}")]
    IssuerMismatch {
        /// Issuer the key material belongs to.
        expected: String,
        /// Issuer named by the token.
        found: String,
    },

    /// `exp` is not in the future.
    #[error("token expired at {expired_at}")]
    Expired {
        /// The `exp` claim (seconds since the epoch).
        expired_at: i64,
    },

    /// `nbf` or `iat` lies in the future beyond the clock-skew leeway.
    #[error("token not valid before {not_before}")]
    NotYetValid {
        /// The offending timestamp (seconds since the epoch).
        not_before: i64,
    },

    /// The required audience is not among the token's audiences.
    #[error("token audience does not include {required}")]
    AudienceMismatch {
        /// The audience the caller required.
        required: String,
    },

    /// A required scope is missing from the token's scope set.
    #[error("token scope is missing {missing}")]
    InsufficientScope {
        /// The first required scope not granted.
        missing: String,
    },
}

impl TokenError {
    /// Short stable label for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::IssuerMismatch { .. } => "issuer_mismatch",
            Self::Expired { .. } => "expired",
            Self::NotYetValid { .. } => "not_yet_valid",
            Self::AudienceMismatch { .. } => "audience_mismatch",
            Self::InsufficientScope { .. } => "insufficient_scope",
        }
    }
}

/// Result type for token validation.
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors returned to callers of the minting path.
#[derive(Debug, Error)]
pub enum MintError {
    /// The process has no private key configured.
    #[error("signing key unavailable")]
    SigningKeyUnavailable,

    /// The request cannot produce a usable credential.
    #[error("invalid token configuration: {0}")]
    InvalidConfiguration(String),

    /// Claims could not be serialized.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for minting.
pub type MintResult<T> = Result<T, MintError>;
