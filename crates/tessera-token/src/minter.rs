//! Minting self-issued tokens.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tessera_crypto::KeyPair;
use tracing::debug;
use uuid::Uuid;

use crate::claims::{Audience, Claims, TokenHeader, WLCG_VERSION};
use crate::codec::encode;
use crate::error::{MintError, MintResult};
use crate::scope::{Scope, ScopeSet};

/// Issues tokens signed with the process's own key.
#[derive(Clone)]
pub struct TokenMinter {
    issuer: String,
    signing_key: Option<Arc<KeyPair>>,
}

impl TokenMinter {
    /// Create a minter for `issuer`. Without a signing key every mint fails
    /// with [`MintError::SigningKeyUnavailable`].
    #[must_use]
    pub fn new(issuer: impl Into<String>, signing_key: Option<Arc<KeyPair>>) -> Self {
        Self {
            issuer: issuer.into(),
            signing_key,
        }
    }

    /// The issuer URL placed in `iss`.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Whether a signing key is configured.
    #[must_use]
    pub fn has_signing_key(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Mint a token for `subject`, valid for `lifetime`.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::InvalidConfiguration`] if `lifetime` is not
    /// positive or `audience` is empty, and
    /// [`MintError::SigningKeyUnavailable`] if no key is configured.
    pub fn mint(
        &self,
        subject: &str,
        audience: &[String],
        scopes: &[Scope],
        lifetime: Duration,
    ) -> MintResult<String> {
        TokenBuilder::new(subject)
            .audiences(audience.iter().cloned())
            .scopes(scopes.iter().cloned())
            .lifetime(lifetime)
            .mint(self)
    }
}

impl std::fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMinter")
            .field("issuer", &self.issuer)
            .field("has_signing_key", &self.has_signing_key())
            .finish()
    }
}

/// Builder for a token request.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    subject: String,
    audience: Vec<String>,
    scopes: ScopeSet,
    lifetime: Duration,
}

impl TokenBuilder {
    /// Default lifetime of a minted token.
    pub const DEFAULT_LIFETIME_SECS: i64 = 300;

    /// Start a request for `subject`.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            audience: Vec::new(),
            scopes: ScopeSet::new(),
            lifetime: Duration::seconds(Self::DEFAULT_LIFETIME_SECS),
        }
    }

    /// Add a recipient.
    #[must_use]
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        let audience = audience.into();
        if !self.audience.contains(&audience) {
            self.audience.push(audience);
        }
        self
    }

    /// Add several recipients.
    #[must_use]
    pub fn audiences(self, audiences: impl IntoIterator<Item = String>) -> Self {
        audiences.into_iter().fold(self, Self::audience)
    }

    /// Grant a scope.
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scopes.insert(scope);
        self
    }

    /// Grant several scopes.
    #[must_use]
    pub fn scopes(self, scopes: impl IntoIterator<Item = Scope>) -> Self {
        scopes.into_iter().fold(self, Self::scope)
    }

    /// Set the lifetime.
    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    fn check(&self, issuer: &str) -> MintResult<()> {
        if issuer.is_empty() {
            return Err(MintError::InvalidConfiguration("issuer is empty".into()));
        }
        if self.subject.is_empty() {
            return Err(MintError::InvalidConfiguration("subject is empty".into()));
        }
        if self.audience.is_empty() {
            return Err(MintError::InvalidConfiguration(
                "at least one audience is required".into(),
            ));
        }
        if self.lifetime <= Duration::zero() {
            return Err(MintError::InvalidConfiguration(format!(
                "lifetime must be positive, got {}s",
                self.lifetime.num_seconds()
            )));
        }
        Ok(())
    }

    /// Sign the request with `minter`'s key.
    ///
    /// # Errors
    ///
    /// See [`TokenMinter::mint`].
    pub fn mint(self, minter: &TokenMinter) -> MintResult<String> {
        self.check(&minter.issuer)?;
        let key = minter
            .signing_key
            .as_deref()
            .ok_or(MintError::SigningKeyUnavailable)?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| MintError::InvalidConfiguration("lifetime overflows".into()))?;

        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            iss: minter.issuer.clone(),
            sub: self.subject,
            aud: Audience::new(self.audience),
            scope: self.scopes,
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
            nbf: None,
            jti: Some(jti.clone()),
            wlcg_ver: Some(WLCG_VERSION.to_owned()),
        };

        let token = encode(&TokenHeader::eddsa(key.key_id().as_str()), &claims, key)?;
        debug!(
            iss = %claims.iss,
            sub = %claims.sub,
            scope = %claims.scope,
            exp = claims.exp,
            jti = %jti,
            "minted token"
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::UnverifiedToken;
    use crate::validator::TokenValidator;
    use tessera_crypto::KeySet;

    const ORIGIN: &str = "https://origin.example.org";

    fn minter() -> (TokenMinter, KeySet) {
        let key = Arc::new(KeyPair::generate());
        let keys = KeySet::from_keys([key.export_public_key()]);
        (TokenMinter::new(ORIGIN, Some(key)), keys)
    }

    #[test]
    fn test_minted_token_validates() {
        let (minter, keys) = minter();
        let token = minter
            .mint(
                ORIGIN,
                &[ORIGIN.to_owned()],
                &[Scope::MONITORING_SCRAPE],
                Duration::minutes(5),
            )
            .unwrap();

        let claims = TokenValidator::new()
            .validate(&token, &keys, ORIGIN, &[Scope::MONITORING_SCRAPE])
            .unwrap();
        assert_eq!(claims.iss, ORIGIN);
        assert_eq!(claims.sub, ORIGIN);
        assert_eq!(claims.wlcg_ver.as_deref(), Some("1.0"));
        assert!(claims.jti.is_some());
        assert_eq!(claims.exp - claims.iat.unwrap(), 300);
    }

    #[test]
    fn test_header_names_signing_key() {
        let (minter, keys) = minter();
        let token = TokenBuilder::new("svc")
            .audience(ORIGIN)
            .scope(Scope::MONITORING_QUERY)
            .mint(&minter)
            .unwrap();

        let parsed = UnverifiedToken::parse(&token).unwrap();
        let kid = parsed.header().kid.clone().unwrap();
        assert!(keys.get(&kid).is_some());
        assert_eq!(parsed.header().typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_unique_jti() {
        let (minter, _) = minter();
        let mint = || {
            let token = minter
                .mint("svc", &[ORIGIN.to_owned()], &[], Duration::minutes(1))
                .unwrap();
            UnverifiedToken::parse(&token)
                .unwrap()
                .into_claims()
                .jti
                .unwrap()
        };
        assert_ne!(mint(), mint());
    }

    #[test]
    fn test_no_signing_key() {
        let minter = TokenMinter::new(ORIGIN, None);
        assert!(matches!(
            minter.mint("svc", &[ORIGIN.to_owned()], &[], Duration::minutes(1)),
            Err(MintError::SigningKeyUnavailable)
        ));
    }

    #[test]
    fn test_invalid_configuration() {
        let (minter, _) = minter();
        let audience = [ORIGIN.to_owned()];

        for lifetime in [Duration::zero(), Duration::seconds(-5)] {
            assert!(matches!(
                minter.mint("svc", &audience, &[], lifetime),
                Err(MintError::InvalidConfiguration(_))
            ));
        }
        assert!(matches!(
            minter.mint("svc", &[], &[], Duration::minutes(1)),
            Err(MintError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            minter.mint("", &audience, &[], Duration::minutes(1)),
            Err(MintError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            TokenMinter::new("", minter.signing_key.clone()).mint(
                "svc",
                &audience,
                &[],
                Duration::minutes(1)
            ),
            Err(MintError::InvalidConfiguration(_))
        ));
    }
}
