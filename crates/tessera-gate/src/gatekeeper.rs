//! Startup wiring from [`Config`].

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use tessera_config::Config;
use tessera_crypto::{JwkSet, KeyPair, KeySet};
use tessera_policy::{CredentialExtractor, PolicyEvaluator};
use tessera_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
use tessera_token::{MintResult, Scope, TokenMinter, TokenValidator};
use tessera_trust::{RegistryConfig, TrustRegistry};
use tracing::info;

use crate::error::{GateError, GateResult};
use crate::middleware::{GateState, gate};
use crate::surface::ProtectedSurface;

/// Both monitoring surfaces plus the server's own token minter.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    evaluator: PolicyEvaluator,
    minter: TokenMinter,
    local_keys: KeySet,
    metrics: ProtectedSurface,
    query: ProtectedSurface,
    token_lifetime: chrono::Duration,
}

impl Gatekeeper {
    /// Build from configuration.
    ///
    /// Loads (or creates) the signing key when `issuer.key_path` is set and
    /// registers its public key as the local issuer under
    /// `server.external_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key file cannot be read or created, the HTTP
    /// client cannot be built, or a configured duration is out of range.
    pub fn from_config(config: &Config) -> GateResult<Self> {
        let external_url = config.server.external_url.as_str();

        let signing_key = match &config.issuer.key_path {
            Some(path) => Some(Arc::new(KeyPair::load_or_generate(path)?)),
            None => None,
        };
        let local_keys = signing_key
            .as_ref()
            .map(|key| KeySet::from_keys([key.export_public_key()]))
            .unwrap_or_default();

        let registry = TrustRegistry::http_builder(&config.issuer.discovery_path)?
            .config(RegistryConfig {
                ttl: config.trust.ttl(),
                grace_period: config.trust.grace_period(),
                fetch_timeout: config.trust.fetch_timeout(),
                failure_backoff: config.trust.failure_backoff(),
            })
            .local_issuer(external_url, local_keys.clone())
            .build();

        let clock_skew = i64::try_from(config.trust.clock_skew_secs).map_err(|_| {
            GateError::InvalidConfiguration("trust.clock_skew_secs is too large".into())
        })?;
        let mut evaluator = PolicyEvaluator::new(registry, external_url, external_url)
            .with_extractor(CredentialExtractor::new(&config.issuer.cookie_name))
            .with_validator(TokenValidator::new().with_clock_skew(clock_skew));
        if let Some(federation) = &config.issuer.federation_url {
            evaluator = evaluator.with_federation(federation);
        }

        let token_lifetime = chrono::Duration::from_std(config.monitoring.token_lifetime())
            .map_err(|_| {
                GateError::InvalidConfiguration(
                    "monitoring.token_expires_in_secs is too large".into(),
                )
            })?;

        let monitoring = &config.monitoring;
        let gatekeeper = Self {
            evaluator,
            minter: TokenMinter::new(external_url, signing_key),
            local_keys,
            metrics: ProtectedSurface::metrics(
                &monitoring.metrics_prefix,
                monitoring.metric_authorization,
            )?,
            query: ProtectedSurface::query_engine(
                &monitoring.query_prefix,
                monitoring.promql_authorization,
            )?,
            token_lifetime,
        };

        info!(
            issuer = external_url,
            federation = config.issuer.federation_url.as_deref().unwrap_or("-"),
            signing_key = gatekeeper.minter.has_signing_key(),
            metrics_enforced = gatekeeper.metrics.is_enforced(),
            query_enforced = gatekeeper.query.is_enforced(),
            "gatekeeper ready"
        );
        Ok(gatekeeper)
    }

    /// Layer the metrics and query gates onto `router`.
    #[must_use]
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(from_fn_with_state(
                GateState::new(self.evaluator.clone(), self.query.clone()),
                gate,
            ))
            .layer(from_fn_with_state(
                GateState::new(self.evaluator.clone(), self.metrics.clone()),
                gate,
            ))
    }

    /// Mint a token this server can present to its own metrics endpoint.
    ///
    /// Issuer, subject, and audience are all the external URL.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::SigningKeyUnavailable`](tessera_token::MintError)
    /// when no signing key is configured.
    pub fn mint_scrape_token(&self) -> MintResult<String> {
        let origin = self.minter.issuer();
        self.minter.mint(
            origin,
            &[origin.to_owned()],
            &[Scope::MONITORING_SCRAPE],
            self.token_lifetime,
        )
    }

    /// The local issuer's public keys as a JWK Set document.
    #[must_use]
    pub fn public_jwks(&self) -> JwkSet {
        self.local_keys.to_jwks()
    }

    /// The policy evaluator shared by both gates.
    #[must_use]
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// The local token minter.
    #[must_use]
    pub fn minter(&self) -> &TokenMinter {
        &self.minter
    }

    /// The metrics surface.
    #[must_use]
    pub fn metrics_surface(&self) -> &ProtectedSurface {
        &self.metrics
    }

    /// The query API surface.
    #[must_use]
    pub fn query_surface(&self) -> &ProtectedSurface {
        &self.query
    }
}

/// Translate the `[logging]` section into a [`LogConfig`].
///
/// # Errors
///
/// Returns an error for an unknown format, target, or rotation, or a file
/// target without a directory.
pub fn log_config(config: &Config) -> GateResult<LogConfig> {
    let logging = &config.logging;
    let format: LogFormat = logging.format.parse()?;
    let mut log = LogConfig::new(&logging.level)
        .with_format(format)
        .with_directives(logging.directives.iter().cloned());

    log = match logging.target.as_str() {
        "stderr" => log.with_target(LogTarget::Stderr),
        "stdout" => log.with_target(LogTarget::Stdout),
        "file" => {
            let directory = logging.directory.as_ref().ok_or_else(|| {
                GateError::InvalidConfiguration("logging.directory is required".into())
            })?;
            let rotation: FileRotation = logging.rotation.parse()?;
            log.with_file_logging(directory, &logging.file_prefix, rotation)
        },
        other => {
            return Err(GateError::InvalidConfiguration(format!(
                "unknown log target '{other}'"
            )));
        },
    };

    if !logging.timestamps {
        log = log.without_timestamps();
    }
    if !logging.ansi {
        log = log.without_ansi();
    }
    Ok(log)
}

/// Install the global subscriber described by `[logging]`.
///
/// # Errors
///
/// Returns an error for an unknown log format or if a subscriber is already
/// installed.
pub fn init_logging(config: &Config) -> GateResult<()> {
    setup_logging(&log_config(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::http::header::AUTHORIZATION;
    use tessera_token::{MintError, UnverifiedToken};

    fn config_with_key(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.server.external_url = "https://origin.example.org".into();
        config.issuer.key_path = Some(dir.path().join("keys").join("issuer.key"));
        config
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_scrape_token_passes_own_metrics_gate() {
        let dir = tempfile::tempdir().unwrap();
        let gatekeeper = Gatekeeper::from_config(&config_with_key(&dir)).unwrap();

        let token = gatekeeper.mint_scrape_token().unwrap();
        let claims = UnverifiedToken::parse(&token).unwrap().into_claims();
        assert_eq!(claims.iss, "https://origin.example.org");
        assert_eq!(claims.sub, "https://origin.example.org");
        assert_eq!(claims.exp.saturating_sub(claims.iat.unwrap()), 3600);

        let option = gatekeeper.metrics_surface().option();
        assert!(
            gatekeeper
                .evaluator()
                .check_any_auth(&bearer(&token), option)
                .await
        );
        // A scrape token is not a query token.
        let option = gatekeeper.query_surface().option();
        assert!(
            !gatekeeper
                .evaluator()
                .check_any_auth(&bearer(&token), option)
                .await
        );
    }

    #[test]
    fn test_key_is_persisted_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_key(&dir);

        let first = Gatekeeper::from_config(&config).unwrap();
        let second = Gatekeeper::from_config(&config).unwrap();
        assert_eq!(first.public_jwks(), second.public_jwks());
        assert_eq!(first.public_jwks().keys.len(), 1);
    }

    #[test]
    fn test_without_key_minting_fails() {
        let gatekeeper = Gatekeeper::from_config(&Config::default()).unwrap();

        assert!(!gatekeeper.minter().has_signing_key());
        assert!(gatekeeper.public_jwks().keys.is_empty());
        assert!(matches!(
            gatekeeper.mint_scrape_token(),
            Err(MintError::SigningKeyUnavailable)
        ));
    }

    #[test]
    fn test_surfaces_follow_monitoring_section() {
        let mut config = Config::default();
        config.monitoring.metric_authorization = false;
        config.monitoring.query_prefix = "/query".into();

        let gatekeeper = Gatekeeper::from_config(&config).unwrap();
        assert!(!gatekeeper.metrics_surface().is_enforced());
        assert!(gatekeeper.query_surface().is_enforced());
        assert_eq!(gatekeeper.query_surface().prefix(), "/query");
    }

    #[test]
    fn test_registry_limits_follow_trust_section() {
        let mut config = Config::default();
        config.trust.ttl_secs = 60;
        config.trust.failure_backoff_secs = 5;

        let gatekeeper = Gatekeeper::from_config(&config).unwrap();
        let limits = gatekeeper.evaluator().registry().config();
        assert_eq!(limits.ttl, std::time::Duration::from_secs(60));
        assert_eq!(limits.failure_backoff, std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_log_config_from_section() {
        let mut config = Config::default();
        config.logging.level = "debug".into();
        config.logging.format = "json".into();
        config.logging.directives = vec!["tessera_trust=trace".into()];

        let log = log_config(&config).unwrap();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["tessera_trust=trace".to_owned()]);

        assert_eq!(log.target, LogTarget::Stderr);
        assert!(log.timestamps && log.ansi);

        config.logging.format = "xml".into();
        assert!(matches!(log_config(&config), Err(GateError::Telemetry(_))));
    }

    #[test]
    fn test_log_config_file_target() {
        let mut config = Config::default();
        config.logging.target = "file".into();
        config.logging.directory = Some("/var/log/tessera".into());
        config.logging.file_prefix = "gate".into();
        config.logging.rotation = "hourly".into();
        config.logging.timestamps = false;

        let log = log_config(&config).unwrap();
        assert_eq!(log.target, LogTarget::File("/var/log/tessera".into()));
        assert_eq!(log.file.prefix, "gate");
        assert_eq!(log.file.rotation, FileRotation::Hourly);
        assert!(!log.timestamps);
        assert!(!log.ansi);

        config.logging.directory = None;
        assert!(matches!(
            log_config(&config),
            Err(GateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_log_config_stdout_without_ansi() {
        let mut config = Config::default();
        config.logging.target = "stdout".into();
        config.logging.ansi = false;

        let log = log_config(&config).unwrap();
        assert_eq!(log.target, LogTarget::Stdout);
        assert!(!log.ansi);
        assert!(log.timestamps);

        config.logging.target = "syslog".into();
        assert!(matches!(
            log_config(&config),
            Err(GateError::InvalidConfiguration(_))
        ));
    }
}
