//! Gate error types.
//!
//! These only occur while wiring the gate at startup; request-time denials
//! are plain 403 responses.

use tessera_crypto::CryptoError;
use tessera_policy::PolicyError;
use tessera_telemetry::TelemetryError;
use tessera_trust::TrustError;
use thiserror::Error;

/// Errors from building a [`Gatekeeper`](crate::Gatekeeper).
#[derive(Debug, Error)]
pub enum GateError {
    /// The signing key could not be loaded or created.
    #[error("signing key error: {0}")]
    Key(#[from] CryptoError),

    /// The key registry could not be created.
    #[error("trust registry error: {0}")]
    Trust(#[from] TrustError),

    /// A surface's auth option is unusable.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Logging could not be set up.
    #[error("logging error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// A configuration value cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for gate setup.
pub type GateResult<T> = Result<T, GateError>;
