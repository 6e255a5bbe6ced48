//! Any-of authorization over (transport, issuer) pairs.

use http::HeaderMap;
use tessera_token::{Claims, Requirements, TokenValidator};
use tessera_trust::TrustRegistry;
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};
use crate::extractor::CredentialExtractor;
use crate::option::{AuthOption, IssuerRef};

/// Decides whether a request carries an acceptable credential.
///
/// Holds the identities of the local and federation issuers, the audience
/// tokens must name (this server), and a handle to the shared key registry.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    registry: TrustRegistry,
    extractor: CredentialExtractor,
    validator: TokenValidator,
    self_issuer: String,
    federation_issuer: Option<String>,
    audience: String,
}

impl PolicyEvaluator {
    /// Create an evaluator for a server whose issuer URL and token audience
    /// are `self_issuer` and `audience`.
    #[must_use]
    pub fn new(
        registry: TrustRegistry,
        self_issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            extractor: CredentialExtractor::default(),
            validator: TokenValidator::new(),
            self_issuer: self_issuer.into(),
            federation_issuer: None,
            audience: audience.into(),
        }
    }

    /// Trust the federation issuer at `url`.
    #[must_use]
    pub fn with_federation(mut self, url: impl Into<String>) -> Self {
        self.federation_issuer = Some(url.into());
        self
    }

    /// Use a different credential extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: CredentialExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Use a different token validator.
    #[must_use]
    pub fn with_validator(mut self, validator: TokenValidator) -> Self {
        self.validator = validator;
        self
    }

    /// The audience tokens must name.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// The shared key registry.
    #[must_use]
    pub fn registry(&self) -> &TrustRegistry {
        &self.registry
    }

    /// Whether any credential on the request satisfies `option`.
    pub async fn check_any_auth(&self, headers: &HeaderMap, option: &AuthOption) -> bool {
        self.authorize(headers, option).await.is_some()
    }

    /// The claims of the first credential that satisfies `option`.
    ///
    /// Pairs are tried transport-major in the caller's order. Each failure is
    /// logged at debug level and the next pair is tried.
    pub async fn authorize(&self, headers: &HeaderMap, option: &AuthOption) -> Option<Claims> {
        let attempts: Vec<_> = self
            .extractor
            .candidates(headers, option.sources())
            .flat_map(|(source, token)| {
                option
                    .issuers()
                    .iter()
                    .map(move |issuer| (source, token, issuer))
            })
            .collect();

        for (source, token, issuer) in attempts {
            match self.try_candidate(token, issuer, option).await {
                Ok(claims) => {
                    debug!(%source, %issuer, sub = %claims.sub, "request authorized");
                    return Some(claims);
                },
                Err(err) => {
                    debug!(
                        %source,
                        %issuer,
                        reason = err.kind(),
                        error = %err,
                        "candidate rejected"
                    );
                },
            }
        }
        None
    }

    fn issuer_url<'a>(&'a self, issuer: &'a IssuerRef) -> PolicyResult<&'a str> {
        match issuer {
            IssuerRef::SelfIssuer => Ok(&self.self_issuer),
            IssuerRef::Federation => self
                .federation_issuer
                .as_deref()
                .ok_or(PolicyError::IssuerNotConfigured("federation")),
            IssuerRef::Named(url) => Ok(url),
        }
    }

    async fn try_candidate(
        &self,
        token: &str,
        issuer: &IssuerRef,
        option: &AuthOption,
    ) -> PolicyResult<Claims> {
        let issuer_url = self.issuer_url(issuer)?;
        let keys = self.registry.resolve(issuer_url).await?;
        let requirements =
            Requirements::new(&self.audience, option.scopes()).with_issuer(issuer_url);
        Ok(self.validator.validate_with(token, &keys, &requirements)?)
    }
}
