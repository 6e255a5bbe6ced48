//! Token validation pipeline.
//!
//! Checks run in a fixed order and stop at the first failure:
//! structure, signature, issuer (optional), lifetime, audience, scope.

use chrono::Utc;
use tessera_crypto::KeySet;
use tracing::trace;

use crate::claims::Claims;
use crate::codec::UnverifiedToken;
use crate::error::{TokenError, TokenResult};
use crate::scope::Scope;

/// Default tolerance for `nbf`/`iat` in the future, in seconds.
pub const DEFAULT_CLOCK_SKEW_SECS: i64 = 30;

/// What a token must satisfy to be accepted.
#[derive(Debug, Clone, Copy)]
pub struct Requirements<'a> {
    /// When set, `iss` must equal this issuer.
    pub issuer: Option<&'a str>,
    /// Audience that must be listed in `aud`.
    pub audience: &'a str,
    /// Scopes that must all be granted.
    pub scopes: &'a [Scope],
}

impl<'a> Requirements<'a> {
    /// Requirements without an issuer check.
    #[must_use]
    pub fn new(audience: &'a str, scopes: &'a [Scope]) -> Self {
        Self {
            issuer: None,
            audience,
            scopes,
        }
    }

    /// Also require `iss` to equal `issuer`.
    #[must_use]
    pub fn with_issuer(mut self, issuer: &'a str) -> Self {
        self.issuer = Some(issuer);
        self
    }
}

/// Validates candidate tokens against an issuer's key set.
#[derive(Debug, Clone, Copy)]
pub struct TokenValidator {
    clock_skew_secs: i64,
}

impl TokenValidator {
    /// Create a validator with the default clock-skew leeway.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
        }
    }

    /// Set the leeway applied to `nbf` and `iat`. Expiry never gets leeway.
    #[must_use]
    pub fn with_clock_skew(mut self, secs: i64) -> Self {
        self.clock_skew_secs = secs.max(0);
        self
    }

    /// Validate `candidate` against `keys`, requiring `audience` and all of `scopes`.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] of the first failing check.
    pub fn validate(
        &self,
        candidate: &str,
        keys: &KeySet,
        audience: &str,
        scopes: &[Scope],
    ) -> TokenResult<Claims> {
        self.validate_with(candidate, keys, &Requirements::new(audience, scopes))
    }

    /// Validate `candidate` against `keys` and the given requirements.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] of the first failing check.
    pub fn validate_with(
        &self,
        candidate: &str,
        keys: &KeySet,
        requirements: &Requirements<'_>,
    ) -> TokenResult<Claims> {
        self.validate_at(candidate, keys, requirements, Utc::now().timestamp())
    }

    fn validate_at(
        &self,
        candidate: &str,
        keys: &KeySet,
        requirements: &Requirements<'_>,
        now: i64,
    ) -> TokenResult<Claims> {
        let token = UnverifiedToken::parse(candidate)?;
        token.verify(keys)?;
        let claims = token.into_claims();

        check_issuer(&claims, requirements.issuer)?;
        self.check_lifetime(&claims, now)?;
        check_audience(&claims, requirements.audience)?;
        check_scopes(&claims, requirements.scopes)?;

        trace!(iss = %claims.iss, sub = %claims.sub, "token accepted");
        Ok(claims)
    }

    fn check_lifetime(&self, claims: &Claims, now: i64) -> TokenResult<()> {
        if now >= claims.exp {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
            });
        }

        let horizon = now.saturating_add(self.clock_skew_secs);
        for not_before in [claims.nbf, claims.iat].into_iter().flatten() {
            if not_before > horizon {
                return Err(TokenError::NotYetValid { not_before });
            }
        }
        Ok(())
    }
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_issuer(claims: &Claims, expected: Option<&str>) -> TokenResult<()> {
    match expected {
        Some(expected) if !same_issuer(&claims.iss, expected) => Err(TokenError::IssuerMismatch {
            expected: expected.to_owned(),
            found: claims.iss.clone(),
        }),
        _ => Ok(()),
    }
}

/// Issuer URLs compare equal regardless of a trailing slash.
fn same_issuer(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

fn check_audience(claims: &Claims, audience: &str) -> TokenResult<()> {
    if claims.aud.contains(audience) {
        Ok(())
    } else {
        Err(TokenError::AudienceMismatch {
            required: audience.to_owned(),
        })
    }
}

fn check_scopes(claims: &Claims, scopes: &[Scope]) -> TokenResult<()> {
    match claims.scope.first_missing(scopes) {
        Some(missing) => Err(TokenError::InsufficientScope {
            missing: missing.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Audience, TokenHeader};
    use crate::codec::encode;
    use crate::scope::ScopeSet;
    use tessera_crypto::KeyPair;

    const ISSUER: &str = "https://issuer.example.org";
    const ORIGIN: &str = "https://origin.example.org";
    const NOW: i64 = 1_700_000_000;

    fn claims(scope: &str, exp: i64) -> Claims {
        Claims {
            iss: ISSUER.into(),
            sub: "svc".into(),
            aud: Audience::new([ORIGIN]),
            scope: ScopeSet::parse(scope),
            exp,
            iat: Some(NOW),
            nbf: None,
            jti: None,
            wlcg_ver: None,
        }
    }

    fn sign(key: &KeyPair, claims: &Claims) -> String {
        encode(&TokenHeader::eddsa(key.key_id().as_str()), claims, key).unwrap()
    }

    fn check(token: &str, keys: &KeySet, scopes: &[Scope], now: i64) -> TokenResult<Claims> {
        TokenValidator::new().validate_at(token, keys, &Requirements::new(ORIGIN, scopes), now)
    }

    #[test]
    fn test_expiry_boundary() {
        let key = KeyPair::generate();
        let keys = KeySet::from_keys([key.export_public_key()]);
        let scopes = [Scope::MONITORING_SCRAPE];

        let expired = sign(&key, &claims("monitoring.scrape", NOW - 1));
        assert_eq!(
            check(&expired, &keys, &scopes, NOW),
            Err(TokenError::Expired {
                expired_at: NOW - 1
            })
        );

        // exp == now is already expired; no leeway on expiry.
        let at_now = sign(&key, &claims("monitoring.scrape", NOW));
        assert!(matches!(
            check(&at_now, &keys, &scopes, NOW),
            Err(TokenError::Expired { .. })
        ));

        let fresh = sign(&key, &claims("monitoring.scrape", NOW + 3600));
        assert!(check(&fresh, &keys, &scopes, NOW).is_ok());
    }

    #[test]
    fn test_not_yet_valid_respects_skew() {
        let key = KeyPair::generate();
        let keys = KeySet::from_keys([key.export_public_key()]);

        let mut within = claims("monitoring.scrape", NOW + 3600);
        within.nbf = Some(NOW + DEFAULT_CLOCK_SKEW_SECS);
        assert!(check(&sign(&key, &within), &keys, &[], NOW).is_ok());

        let mut beyond = claims("monitoring.scrape", NOW + 3600);
        beyond.nbf = Some(NOW + DEFAULT_CLOCK_SKEW_SECS + 1);
        assert!(matches!(
            check(&sign(&key, &beyond), &keys, &[], NOW),
            Err(TokenError::NotYetValid { .. })
        ));

        let mut future_iat = claims("monitoring.scrape", NOW + 3600);
        future_iat.iat = Some(NOW + 600);
        assert!(matches!(
            check(&sign(&key, &future_iat), &keys, &[], NOW),
            Err(TokenError::NotYetValid { not_before }) if not_before == NOW + 600
        ));
    }

    #[test]
    fn test_scope_and_semantics() {
        let key = KeyPair::generate();
        let keys = KeySet::from_keys([key.export_public_key()]);
        let read_write = [Scope::new("read"), Scope::new("write")];

        let read_only = sign(&key, &claims("read", NOW + 60));
        assert_eq!(
            check(&read_only, &keys, &read_write, NOW),
            Err(TokenError::InsufficientScope {
                missing: "write".into()
            })
        );

        let both = sign(&key, &claims("read write", NOW + 60));
        assert!(check(&both, &keys, &read_write[..1], NOW).is_ok());
        assert!(check(&both, &keys, &read_write, NOW).is_ok());
    }

    #[test]
    fn test_audience_must_match() {
        let key = KeyPair::generate();
        let keys = KeySet::from_keys([key.export_public_key()]);
        let mut other = claims("read", NOW + 60);
        other.aud = Audience::new(["https://elsewhere.example.org", "https://third.example.org"]);

        assert_eq!(
            check(&sign(&key, &other), &keys, &[], NOW),
            Err(TokenError::AudienceMismatch {
                required: ORIGIN.into()
            })
        );
    }

    #[test]
    fn test_issuer_isolation() {
        let x = KeyPair::generate();
        let y = KeyPair::generate();
        let token = sign(&x, &claims("read", NOW + 60));

        assert_eq!(
            check(&token, &KeySet::from_keys([y.export_public_key()]), &[], NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_expected_issuer() {
        let key = KeyPair::generate();
        let keys = KeySet::from_keys([key.export_public_key()]);
        let token = sign(&key, &claims("read", NOW + 60));
        let validator = TokenValidator::new();

        let ok = Requirements::new(ORIGIN, &[]).with_issuer(ISSUER);
        assert!(validator.validate_at(&token, &keys, &ok, NOW).is_ok());

        let slash = format!("{ISSUER}/");
        let ok = Requirements::new(ORIGIN, &[]).with_issuer(&slash);
        assert!(validator.validate_at(&token, &keys, &ok, NOW).is_ok());

        let wrong = Requirements::new(ORIGIN, &[]).with_issuer("https://other.example.org");
        assert!(matches!(
            validator.validate_at(&token, &keys, &wrong, NOW),
            Err(TokenError::IssuerMismatch { .. })
        ));
    }

    #[test]
    fn test_checks_run_in_order() {
        // Expired and wrong audience and missing scope: expiry is reported first.
        let key = KeyPair::generate();
        let keys = KeySet::from_keys([key.export_public_key()]);
        let mut bad = claims("", NOW - 10);
        bad.aud = Audience::new(["https://elsewhere.example.org"]);

        assert!(matches!(
            check(&sign(&key, &bad), &keys, &[Scope::MONITORING_QUERY], NOW),
            Err(TokenError::Expired { .. })
        ));
        assert!(matches!(
            check("not-a-token", &keys, &[], NOW),
            Err(TokenError::MalformedToken(_))
        ));
    }
}
