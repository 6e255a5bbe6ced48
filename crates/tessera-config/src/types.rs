//! Configuration types.
//!
//! Every struct implements [`Default`] matching `defaults.toml`, so a bare
//! `[section]` header in TOML produces a working configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// This server's identity.
    pub server: ServerSection,
    /// Local signing key and trusted issuers.
    pub issuer: IssuerSection,
    /// Protected monitoring surfaces.
    pub monitoring: MonitoringSection,
    /// Issuer key cache behaviour.
    pub trust: TrustSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ServerSection
// ---------------------------------------------------------------------------

/// This server's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// External URL of the server. Used as the local issuer, the subject of
    /// self-minted tokens, and the audience incoming tokens must name.
    pub external_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            external_url: "https://localhost:8444".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// IssuerSection
// ---------------------------------------------------------------------------

/// Local signing key and trusted issuers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerSection {
    /// Ed25519 private key file, created on first use. Without it the server
    /// cannot mint tokens and self-issued tokens never validate.
    pub key_path: Option<PathBuf>,
    /// Federation issuer URL. When unset, federation tokens are never accepted.
    pub federation_url: Option<String>,
    /// Path of the issuer metadata document.
    pub discovery_path: String,
    /// Cookie carrying the web UI login token.
    pub cookie_name: String,
}

impl Default for IssuerSection {
    fn default() -> Self {
        Self {
            key_path: None,
            federation_url: None,
            discovery_path: "/.well-known/openid-configuration".to_owned(),
            cookie_name: "login".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// MonitoringSection
// ---------------------------------------------------------------------------

/// Protected monitoring surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSection {
    /// Require a `monitoring.scrape` token on the metrics endpoint.
    pub metric_authorization: bool,
    /// Require a `monitoring.query` token on the query API.
    pub promql_authorization: bool,
    /// Lifetime of self-minted scrape tokens, in seconds.
    pub token_expires_in_secs: u64,
    /// Path prefix of the metrics endpoint.
    pub metrics_prefix: String,
    /// Path prefix of the query API.
    pub query_prefix: String,
}

impl MonitoringSection {
    /// Lifetime of self-minted scrape tokens.
    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_expires_in_secs)
    }
}

impl Default for MonitoringSection {
    fn default() -> Self {
        Self {
            metric_authorization: true,
            promql_authorization: true,
            token_expires_in_secs: 3600,
            metrics_prefix: "/metrics".to_owned(),
            query_prefix: "/api/v1.0/prometheus".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// TrustSection
// ---------------------------------------------------------------------------

/// Issuer key cache behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustSection {
    /// Seconds fetched keys are used before refreshing.
    pub ttl_secs: u64,
    /// Seconds past the TTL stale keys may be served when a refresh fails.
    pub grace_period_secs: u64,
    /// Upper bound on one key fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Seconds stale keys are served without retrying after a failed
    /// refresh. `0` retries on every request.
    pub failure_backoff_secs: u64,
    /// Tolerance for `nbf`/`iat` in the future, in seconds.
    pub clock_skew_secs: u64,
}

impl TrustSection {
    /// Key cache TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Grace period after a failed refresh.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Backoff after a failed refresh.
    #[must_use]
    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }
}

impl Default for TrustSection {
    fn default() -> Self {
        Self {
            ttl_secs: 900,
            grace_period_secs: 3600,
            fetch_timeout_secs: 10,
            failure_backoff_secs: 30,
            clock_skew_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["tessera_trust=debug",
    /// "hyper=warn"]`).
    pub directives: Vec<String>,
    /// Output: `"stderr"`, `"stdout"`, or `"file"`.
    pub target: String,
    /// Log directory, required when `target = "file"`.
    pub directory: Option<PathBuf>,
    /// Log file name prefix.
    pub file_prefix: String,
    /// File rotation: `"daily"`, `"hourly"`, or `"never"`.
    pub rotation: String,
    /// Include timestamps.
    pub timestamps: bool,
    /// Use ANSI colors (always off for files).
    pub ansi: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            target: "stderr".to_owned(),
            directory: None,
            file_prefix: "tessera".to_owned(),
            rotation: "daily".to_owned(),
            timestamps: true,
            ansi: true,
        }
    }
}
